#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use nodeview_core::model::{Attrs, Node, NodeSpec, Schema, attrs_from_json};
use nodeview_core::portal::{PortalHandle, PortalRegistry, RenderNode, TreeHost};
use nodeview_core::view::{Component, DRAG_HANDLE_ATTR, NodeViewProps};
use nodeview_core::{HostHandle, HostTree};
use serde_json::json;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn schema() -> Schema {
    Schema::new()
        .with_node("paragraph", NodeSpec::block())
        .with_node("image", NodeSpec::block().leaf().draggable())
        .with_node("table", NodeSpec::block())
        .with_node("embed", NodeSpec::block().leaf())
}

pub fn image(schema: &Schema, src: &str) -> Node {
    schema
        .node("image", attrs_from_json(json!({ "src": src })), vec![])
        .unwrap()
}

pub fn paragraph(schema: &Schema, text: &str) -> Node {
    schema
        .node("paragraph", Attrs::new(), vec![schema.text(text).unwrap()])
        .unwrap()
}

/// Table spanning 50 positions: one paragraph of 46 characters
pub fn table(schema: &Schema) -> Node {
    let cell = paragraph(schema, &"x".repeat(46));
    schema.node("table", Attrs::new(), vec![cell]).unwrap()
}

pub fn embed(schema: &Schema) -> Node {
    schema.node("embed", Attrs::new(), vec![]).unwrap()
}

pub fn doc(schema: &Schema, content: Vec<Node>) -> Node {
    schema.node("doc", Attrs::new(), content).unwrap()
}

/// Host tree, portal registry and a log of every hosted render
pub struct Fixture {
    pub tree: HostHandle,
    pub portal: PortalHandle<TreeHost>,
    pub renders: Rc<RefCell<Vec<NodeViewProps>>>,
}

impl Fixture {
    pub fn new() -> Self {
        init_logging();
        let tree = HostTree::shared();
        let portal = PortalRegistry::shared(TreeHost::new(), tree.clone());
        Self {
            tree,
            portal,
            renders: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.borrow().len()
    }

    pub fn last_render(&self) -> NodeViewProps {
        self.renders.borrow().last().cloned().unwrap()
    }

    /// Figure with a drag handle, an image and its caption
    pub fn figure(&self) -> Component<RenderNode> {
        let renders = self.renders.clone();
        Rc::new(move |props: &NodeViewProps| {
            renders.borrow_mut().push(props.clone());
            RenderNode::element("figure")
                .child(
                    RenderNode::element("span")
                        .attr(DRAG_HANDLE_ATTR, "")
                        .text_child("drag"),
                )
                .child(RenderNode::element("img").attr("src", props.attr_str("src").unwrap_or_default()))
        })
    }

    /// Table whose body receives the editable content
    pub fn table(&self) -> Component<RenderNode> {
        let renders = self.renders.clone();
        Rc::new(move |props: &NodeViewProps| {
            renders.borrow_mut().push(props.clone());
            let table = RenderNode::element("table");
            let table = if props.selected {
                table.class("selected")
            } else {
                table
            };
            table.child(RenderNode::element("tbody").with_ref(props.forward_ref.clone()))
        })
    }
}
