use thiserror::Error;

use crate::host::HostId;

#[derive(Debug, Error)]
pub enum PortalError {
    /// The mount point was detached before the portal could release it.
    /// Callers tearing down a view treat this as an expected race.
    #[error("Mount point {0:?} is no longer attached to the host tree")]
    NotAttached(HostId),

    #[error("Failed to mount into {mount_point:?}: {reason}")]
    Mount { mount_point: HostId, reason: String },
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Position {pos} is outside the document (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("No node starts at position {0}")]
    NoNodeAt(usize),

    #[error("Range {from}..{to} does not line up with node boundaries")]
    InvalidRange { from: usize, to: usize },

    #[error("Unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("Node view is detached from the document")]
    Detached,

    #[error("Editor has been dropped")]
    EditorGone,

    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error("Listener failed: {0}")]
    Listener(#[from] anyhow::Error),
}
