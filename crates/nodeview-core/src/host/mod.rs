//! Arena model of the host environment's element tree.
//!
//! Node views, the document engine and portal hosts all address elements by
//! [`HostId`]. "Removing" an element only detaches it from its parent, which
//! is exactly the state a real DOM node is in after the document engine has
//! dropped it. Subtrees nobody will attach again are reclaimed with
//! [`HostTree::free`]; a freed id reads as an empty, detached element.

pub mod event;

pub use event::{DataTransfer, EventKind, HostEvent, HostMutation, MutationKind};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

/// Shared handle to the host tree
pub type HostHandle = Rc<RefCell<HostTree>>;

/// Callback receiving the host element a rendered node was mounted as
pub type ForwardRef = Rc<dyn Fn(&mut HostTree, HostId)>;

pub const CONTENT_EDITABLE_ATTR: &str = "contenteditable";

new_key_type! {
    /// Generational handle to an element; stays invalid once freed
    pub struct HostId;
}

/// Layout box reported by the host for an element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

static FREED: HostNode = HostNode {
    tag: String::new(),
    parent: None,
    children: Vec::new(),
    attributes: BTreeMap::new(),
    classes: Vec::new(),
    styles: BTreeMap::new(),
    text: None,
    markup: None,
    rect: Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    },
};

#[derive(Debug, Clone, Default)]
struct HostNode {
    tag: String,
    parent: Option<HostId>,
    children: Vec<HostId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: Option<String>,
    markup: Option<String>,
    rect: Rect,
}

#[derive(Debug)]
pub struct HostTree {
    nodes: SlotMap<HostId, HostNode>,
    root: HostId,
}

impl Default for HostTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTree {
    pub fn new() -> Self {
        let body = HostNode {
            tag: "body".to_string(),
            ..HostNode::default()
        };
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(body);
        Self { nodes, root }
    }

    pub fn shared() -> HostHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn root(&self) -> HostId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> HostId {
        self.push(HostNode {
            tag: tag.to_ascii_lowercase(),
            ..HostNode::default()
        })
    }

    pub fn create_text(&mut self, text: &str) -> HostId {
        self.push(HostNode {
            tag: "#text".to_string(),
            text: Some(text.to_string()),
            ..HostNode::default()
        })
    }

    fn push(&mut self, node: HostNode) -> HostId {
        self.nodes.insert(node)
    }

    fn node(&self, id: HostId) -> &HostNode {
        self.nodes.get(id).unwrap_or(&FREED)
    }

    fn node_mut(&mut self, id: HostId) -> Option<&mut HostNode> {
        self.nodes.get_mut(id)
    }

    pub fn exists(&self, id: HostId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Live elements in the arena, the root included
    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    /// Detach `id` and release it together with its whole subtree, returning
    /// the number of elements freed. The root is never freed.
    pub fn free(&mut self, id: HostId) -> usize {
        if id == self.root {
            log::warn!("refusing to free the host tree root");
            return 0;
        }
        self.detach(id);
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }

    pub fn tag(&self, id: HostId) -> &str {
        &self.node(id).tag
    }

    pub fn parent(&self, id: HostId) -> Option<HostId> {
        self.node(id).parent
    }

    pub fn children(&self, id: HostId) -> &[HostId] {
        &self.node(id).children
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Appending an ancestor of `parent` would create a cycle and is ignored.
    pub fn append_child(&mut self, parent: HostId, child: HostId) {
        if !self.exists(parent) || !self.exists(child) {
            log::warn!("cannot append freed element {child:?} / {parent:?}");
            return;
        }
        if self.contains(child, parent) {
            log::warn!("refusing to append {child:?} into its own descendant {parent:?}");
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Detach `id` from its parent; returns false when it was not attached
    pub fn remove(&mut self, id: HostId) -> bool {
        self.detach(id)
    }

    fn detach(&mut self, id: HostId) -> bool {
        let Some(parent) = self.node_mut(id).and_then(|node| node.parent.take()) else {
            return false;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        true
    }

    /// Inclusive containment: every node contains itself
    pub fn contains(&self, ancestor: HostId, node: HostId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `id` is reachable from the tree root
    pub fn is_connected(&self, id: HostId) -> bool {
        self.contains(self.root, id)
    }

    pub fn depth(&self, id: HostId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    pub fn set_attribute(&mut self, id: HostId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: HostId, name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attributes.remove(name);
        }
    }

    pub fn attribute(&self, id: HostId, name: &str) -> Option<&str> {
        self.node(id).attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, id: HostId, name: &str) -> bool {
        self.node(id).attributes.contains_key(name)
    }

    pub fn add_class(&mut self, id: HostId, class: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if !node.classes.iter().any(|existing| existing == class) {
            node.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, id: HostId, class: &str) -> bool {
        self.node(id).classes.iter().any(|existing| existing == class)
    }

    pub fn set_style(&mut self, id: HostId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    pub fn style(&self, id: HostId, property: &str) -> Option<&str> {
        self.node(id).styles.get(property).map(String::as_str)
    }

    pub fn set_rect(&mut self, id: HostId, rect: Rect) {
        if let Some(node) = self.node_mut(id) {
            node.rect = rect;
        }
    }

    pub fn rect(&self, id: HostId) -> Rect {
        self.node(id).rect
    }

    /// Markup produced by string-rendering portal hosts
    pub fn set_markup(&mut self, id: HostId, markup: Option<String>) {
        if let Some(node) = self.node_mut(id) {
            node.markup = markup;
        }
    }

    pub fn markup(&self, id: HostId) -> Option<&str> {
        self.node(id).markup.as_deref()
    }

    pub fn text(&self, id: HostId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    /// Resolve editability through the nearest `contenteditable` attribute
    pub fn is_content_editable(&self, id: HostId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.attribute(node, CONTENT_EDITABLE_ATTR) {
                Some("false") => return false,
                Some(_) => return true,
                None => current = self.parent(node),
            }
        }
        false
    }

    /// First descendant of `root` (excluding `root`) carrying `attr`, in document order
    pub fn query_attr(&self, root: HostId, attr: &str) -> Option<HostId> {
        let mut stack: Vec<HostId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.has_attribute(id, attr) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    /// Nearest inclusive ancestor of `id` carrying `attr`, not looking past `boundary`
    pub fn closest_attr(&self, id: HostId, attr: &str, boundary: HostId) -> Option<HostId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.has_attribute(node, attr) {
                return Some(node);
            }
            if node == boundary {
                return None;
            }
            current = self.parent(node);
        }
        None
    }

    /// Indented dump of the subtree under `id`
    pub fn outline(&self, id: HostId) -> String {
        let mut out = String::new();
        self.write_outline(id, 0, &mut out);
        out
    }

    fn write_outline(&self, id: HostId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let indent = "  ".repeat(depth);
        if let Some(text) = &node.text {
            let _ = writeln!(out, "{indent}{text:?}");
            return;
        }
        let _ = write!(out, "{indent}<{}", node.tag);
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        let _ = writeln!(out, ">");
        for child in &node.children {
            self.write_outline(*child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_moves_between_parents() {
        let mut tree = HostTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let child = tree.create_element("span");
        tree.append_child(tree.root(), a);
        tree.append_child(tree.root(), b);

        tree.append_child(a, child);
        tree.append_child(b, child);

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[child]);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn test_remove_reports_whether_attached() {
        let mut tree = HostTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div);

        assert!(tree.remove(div));
        assert!(!tree.remove(div));
        assert!(!tree.is_connected(div));
    }

    #[test]
    fn test_free_reclaims_subtree_and_reuses_slots() {
        let mut tree = HostTree::new();
        let figure = tree.create_element("figure");
        let img = tree.create_element("img");
        let caption = tree.create_text("x");
        tree.append_child(tree.root(), figure);
        tree.append_child(figure, img);
        tree.append_child(figure, caption);
        assert_eq!(tree.element_count(), 4);

        assert_eq!(tree.free(figure), 3);

        assert_eq!(tree.element_count(), 1);
        assert!(tree.children(tree.root()).is_empty());
        assert!(!tree.exists(img));
        assert_eq!(tree.parent(img), None);
        assert_eq!(tree.tag(img), "");

        let reused = tree.create_element("p");
        assert_ne!(reused, figure);
        assert!(!tree.exists(figure));
        assert_eq!(tree.element_count(), 2);
    }

    #[test]
    fn test_writes_to_freed_elements_are_ignored() {
        let mut tree = HostTree::new();
        let div = tree.create_element("div");
        tree.free(div);

        tree.set_attribute(div, "data-theme", "dark");
        tree.append_child(tree.root(), div);

        assert_eq!(tree.attribute(div, "data-theme"), None);
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.free(tree.root()), 0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let mut tree = HostTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("p");
        tree.append_child(outer, inner);

        assert!(tree.contains(outer, outer));
        assert!(tree.contains(outer, inner));
        assert!(!tree.contains(inner, outer));
    }

    #[test]
    fn test_append_ancestor_into_descendant_is_ignored() {
        let mut tree = HostTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("p");
        tree.append_child(outer, inner);

        tree.append_child(inner, outer);

        assert_eq!(tree.parent(outer), None);
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn test_content_editable_inherits_until_false() {
        let mut tree = HostTree::new();
        let editable = tree.create_element("div");
        let island = tree.create_element("div");
        let leaf = tree.create_element("span");
        tree.set_attribute(editable, CONTENT_EDITABLE_ATTR, "true");
        tree.set_attribute(island, CONTENT_EDITABLE_ATTR, "false");
        tree.append_child(editable, island);
        tree.append_child(island, leaf);

        assert!(tree.is_content_editable(editable));
        assert!(!tree.is_content_editable(island));
        assert!(!tree.is_content_editable(leaf));
    }

    #[test]
    fn test_query_attr_skips_root_and_uses_document_order() {
        let mut tree = HostTree::new();
        let root = tree.create_element("div");
        let first = tree.create_element("span");
        let nested = tree.create_element("i");
        let second = tree.create_element("span");
        tree.set_attribute(root, "data-drag-handle", "");
        tree.set_attribute(nested, "data-drag-handle", "");
        tree.set_attribute(second, "data-drag-handle", "");
        tree.append_child(root, first);
        tree.append_child(first, nested);
        tree.append_child(root, second);

        assert_eq!(tree.query_attr(root, "data-drag-handle"), Some(nested));
    }

    #[test]
    fn test_closest_attr_stops_at_boundary() {
        let mut tree = HostTree::new();
        let outer = tree.create_element("div");
        let view = tree.create_element("div");
        let target = tree.create_element("span");
        tree.set_attribute(outer, "data-drag-handle", "");
        tree.append_child(outer, view);
        tree.append_child(view, target);

        assert_eq!(tree.closest_attr(target, "data-drag-handle", view), None);
        assert_eq!(
            tree.closest_attr(target, "data-drag-handle", outer),
            Some(outer)
        );
    }

    #[test]
    fn test_outline_lists_classes_attributes_and_text() {
        let mut tree = HostTree::new();
        let div = tree.create_element("DIV");
        let text = tree.create_text("hello");
        tree.add_class(div, "table-view-content-wrap");
        tree.set_attribute(div, "data-theme", "light");
        tree.append_child(tree.root(), div);
        tree.append_child(div, text);

        insta::assert_snapshot!(tree.outline(tree.root()), @r#"
        <body>
          <div class="table-view-content-wrap" data-theme="light">
            "hello"
        "#);
    }
}
