use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::editor::EditorHandle;
use crate::error::EditorError;
use crate::host::ForwardRef;
use crate::model::{Attrs, Node};

/// Resolves a view's current start position; `None` once the view is gone
pub type PositionResolver = Rc<dyn Fn() -> Option<usize>>;

/// Attribute command handed to hosted components
pub type AttributeUpdater = Rc<dyn Fn(Attrs, UpdateOptions) -> Result<(), EditorError>>;

/// Renders a hosted component for the given props
pub type Component<E> = Rc<dyn Fn(&NodeViewProps) -> E>;

/// Transaction metadata for an attribute update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub add_to_history: bool,
    pub prevent_update: bool,
    pub force_update: bool,
}

/// Everything a hosted component receives on each render
#[derive(Clone)]
pub struct NodeViewProps {
    pub node: Node,
    pub pos: Option<usize>,
    pub selected: bool,
    pub editor: EditorHandle,
    pub get_pos: PositionResolver,
    pub update_attributes: AttributeUpdater,
    pub forward_ref: ForwardRef,
}

impl NodeViewProps {
    pub fn attrs(&self) -> &Attrs {
        self.node.attrs()
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.node.attr(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.node.attr(name).and_then(Value::as_str)
    }

    pub fn update_attributes(&self, attrs: Attrs, options: UpdateOptions) -> Result<(), EditorError> {
        (self.update_attributes)(attrs, options)
    }
}

impl PartialEq for NodeViewProps {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.pos == other.pos && self.selected == other.selected
    }
}

impl fmt::Debug for NodeViewProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeViewProps")
            .field("node", &self.node)
            .field("pos", &self.pos)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}
