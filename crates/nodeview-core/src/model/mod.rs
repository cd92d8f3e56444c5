//! Document engine collaborator: a small ProseMirror-shaped model.
//!
//! - **`node`**: immutable, shared document nodes and their schema
//! - **`selection`**: text and whole-node selections
//! - **`mapping`**: carrying positions through document changes
//! - **`transaction`**: steps, metadata and state application
//! - **`patch`**: what a transaction changed

pub mod mapping;
pub mod node;
pub mod patch;
pub mod selection;
pub mod transaction;

pub use mapping::{Assoc, MapResult, Mapping, StepMap};
pub use node::{Attrs, Node, NodeSpec, NodeType, Schema, attrs_from_json};
pub use patch::Patch;
pub use selection::Selection;
pub use transaction::{Applied, EditorState, Step, Transaction, TransactionMeta};
