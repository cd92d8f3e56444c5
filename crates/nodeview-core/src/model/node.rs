use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::EditorError;

/// Node attributes, keyed by name
pub type Attrs = BTreeMap<String, Value>;

/// Build [`Attrs`] from a JSON object; anything else yields no attributes
pub fn attrs_from_json(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Attrs::new(),
    }
}

/// Static description of a node type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub inline: bool,
    pub atom: bool,
    pub leaf: bool,
    pub draggable: bool,
    pub selectable: bool,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            inline: false,
            atom: false,
            leaf: false,
            draggable: false,
            selectable: true,
        }
    }
}

impl NodeSpec {
    pub fn block() -> Self {
        Self::default()
    }

    pub fn inline() -> Self {
        Self {
            inline: true,
            ..Self::default()
        }
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn leaf(mut self) -> Self {
        self.leaf = true;
        self
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct NodeType {
    name: String,
    spec: NodeSpec,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }
}

/// Registry of the node types a document may contain.
///
/// `doc` and `text` are always present.
#[derive(Debug, Clone)]
pub struct Schema {
    types: BTreeMap<String, Rc<NodeType>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
        .with_node("doc", NodeSpec::block())
        .with_node("text", NodeSpec::inline().leaf())
    }

    pub fn with_node(mut self, name: &str, spec: NodeSpec) -> Self {
        self.types.insert(
            name.to_string(),
            Rc::new(NodeType {
                name: name.to_string(),
                spec,
            }),
        );
        self
    }

    pub fn node_type(&self, name: &str) -> Result<Rc<NodeType>, EditorError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| EditorError::UnknownNodeType(name.to_string()))
    }

    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Result<Node, EditorError> {
        let node_type = self.node_type(name)?;
        Ok(Node::new(node_type, attrs, content))
    }

    pub fn text(&self, text: &str) -> Result<Node, EditorError> {
        let node_type = self.node_type("text")?;
        Ok(Node(Rc::new(NodeInner {
            node_type,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.to_string()),
        })))
    }
}

#[derive(Debug)]
struct NodeInner {
    node_type: Rc<NodeType>,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
}

/// Immutable document node.
///
/// Cloning is cheap and shares the underlying node; every edit produces new
/// nodes along the edited path and shares the rest. Positions inside a node
/// are relative to the start of its content.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    pub fn new(node_type: Rc<NodeType>, attrs: Attrs, content: Vec<Node>) -> Self {
        Self(Rc::new(NodeInner {
            node_type,
            attrs,
            content,
            text: None,
        }))
    }

    pub fn node_type(&self) -> &Rc<NodeType> {
        &self.0.node_type
    }

    pub fn type_name(&self) -> &str {
        self.0.node_type.name()
    }

    pub fn spec(&self) -> &NodeSpec {
        self.0.node_type.spec()
    }

    pub fn same_type(&self, other: &Node) -> bool {
        self.type_name() == other.type_name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn children(&self) -> &[Node] {
        &self.0.content
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_inline(&self) -> bool {
        self.spec().inline
    }

    pub fn is_leaf(&self) -> bool {
        self.is_text() || self.spec().leaf
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.spec().atom
    }

    pub fn content_size(&self) -> usize {
        self.0.content.iter().map(Node::node_size).sum()
    }

    pub fn node_size(&self) -> usize {
        match &self.0.text {
            Some(text) => text.chars().count(),
            None if self.spec().leaf => 1,
            None => self.content_size() + 2,
        }
    }

    /// Whether both handles share the same underlying node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Same type and attributes, regardless of content
    pub fn same_markup(&self, other: &Node) -> bool {
        self.same_type(other) && self.attrs() == other.attrs()
    }

    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => self.0.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Copy of this node with `attrs` replacing its attributes
    pub fn with_attrs(&self, attrs: Attrs) -> Node {
        Node(Rc::new(NodeInner {
            node_type: self.0.node_type.clone(),
            attrs,
            content: self.0.content.clone(),
            text: self.0.text.clone(),
        }))
    }

    fn with_content(&self, content: Vec<Node>) -> Node {
        Node(Rc::new(NodeInner {
            node_type: self.0.node_type.clone(),
            attrs: self.0.attrs.clone(),
            content,
            text: self.0.text.clone(),
        }))
    }

    /// Node starting exactly at `pos`, at any depth
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut offset = 0;
        for child in self.children() {
            if offset == pos {
                return Some(child.clone());
            }
            let end = offset + child.node_size();
            if pos > offset && pos < end {
                if child.is_leaf() {
                    return None;
                }
                return child.node_at(pos - offset - 1);
            }
            offset = end;
        }
        None
    }

    /// Visit every descendant with its position. Returning false from `f`
    /// skips that node's children.
    pub fn descendants(&self, f: &mut dyn FnMut(&Node, usize) -> bool) {
        self.descendants_from(0, f);
    }

    fn descendants_from(&self, start: usize, f: &mut dyn FnMut(&Node, usize) -> bool) {
        let mut offset = start;
        for child in self.children() {
            if f(child, offset) && !child.is_leaf() {
                child.descendants_from(offset + 1, f);
            }
            offset += child.node_size();
        }
    }

    /// Replace the whole children covering `from..to` with `nodes`.
    ///
    /// The range must start and end on child boundaries of a single parent;
    /// splitting text or crossing parents is rejected.
    pub fn replace_range(&self, from: usize, to: usize, nodes: &[Node]) -> Result<Node, EditorError> {
        if from > to || to > self.content_size() {
            return Err(EditorError::InvalidRange { from, to });
        }

        let mut offset = 0;
        for (index, child) in self.children().iter().enumerate() {
            let end = offset + child.node_size();
            if from > offset && to < end && !child.is_leaf() {
                let inner = child.replace_range(from - offset - 1, to - offset - 1, nodes)?;
                let mut content = self.0.content.clone();
                content[index] = inner;
                return Ok(self.with_content(content));
            }
            offset = end;
        }

        let start = self.child_index_at(from)?;
        let end = self.child_index_at(to)?;
        let mut content = self.0.content.clone();
        content.splice(start..end, nodes.iter().cloned());
        Ok(self.with_content(content))
    }

    fn child_index_at(&self, pos: usize) -> Result<usize, EditorError> {
        let mut offset = 0;
        for (index, child) in self.children().iter().enumerate() {
            if offset == pos {
                return Ok(index);
            }
            offset += child.node_size();
        }
        if offset == pos {
            return Ok(self.children().len());
        }
        Err(EditorError::InvalidRange { from: pos, to: pos })
    }

    pub fn to_json(&self) -> Value {
        let mut json = serde_json::json!({ "type": self.type_name() });
        if !self.attrs().is_empty() {
            json["attrs"] = serde_json::to_value(self.attrs()).unwrap_or(Value::Null);
        }
        if let Some(text) = self.text() {
            json["text"] = Value::String(text.to_string());
        }
        if !self.children().is_empty() {
            json["content"] = Value::Array(self.children().iter().map(Node::to_json).collect());
        }
        json
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.same_markup(other)
                && self.0.text == other.0.text
                && self.0.content == other.0.content)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.text() {
            return write!(f, "{text:?}");
        }
        let mut debug = f.debug_struct(self.type_name());
        if !self.attrs().is_empty() {
            debug.field("attrs", self.attrs());
        }
        if !self.children().is_empty() {
            debug.field("content", &self.0.content);
        }
        debug.finish()
    }
}
