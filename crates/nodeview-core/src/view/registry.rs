use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::editor::EditorHandle;
use crate::model::Node;
use crate::view::{NodeViewBehavior, PositionResolver};

/// Creates the view for one node; called by the editor, never by users
pub type NodeViewFactory =
    Rc<dyn Fn(Node, PositionResolver, EditorHandle) -> Rc<RefCell<dyn NodeViewBehavior>>>;

/// Node-view factories keyed by node type name
#[derive(Clone, Default)]
pub struct NodeViewRegistry {
    factories: HashMap<String, NodeViewFactory>,
}

impl NodeViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, type_name: &str, factory: NodeViewFactory) -> Self {
        self.register(type_name, factory);
        self
    }

    /// Register `factory` for `type_name`, replacing any earlier one
    pub fn register(&mut self, type_name: &str, factory: NodeViewFactory) {
        self.factories.insert(type_name.to_string(), factory);
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeViewFactory> {
        self.factories.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
