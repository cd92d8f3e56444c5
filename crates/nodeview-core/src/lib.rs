pub mod dispatcher;
pub mod editor;
pub mod error;
pub mod host;
pub mod model;
pub mod portal;
pub mod view;

// Re-export key types for easier usage
pub use dispatcher::{EventDispatcher, Listener};
pub use editor::{Editor, EditorHandle, EditorOptions};
pub use error::{EditorError, PortalError};
pub use host::{EventKind, HostEvent, HostHandle, HostId, HostMutation, HostTree, MutationKind};
pub use model::{Attrs, EditorState, Node, NodeSpec, Patch, Schema, Selection, Transaction};
pub use portal::{
    Ambient, DeferredRemovals, PortalHandle, PortalHost, PortalRegistry, RenderNode, Theme,
    TreeHost,
};
pub use view::{
    ContentDom, ContentParts, NodeViewBehavior, NodeViewOptions, NodeViewProps, NodeViewRegistry,
    UpdateOptions, create_node_view, create_selection_based_node_view,
};
