//! Which host events and mutations a node view keeps for itself.
//!
//! Both decisions only look at the host tree, the view's two elements and
//! the node it renders, so they are kept free of view state.

use crate::host::{EventKind, HostEvent, HostId, HostMutation, HostTree, MutationKind};
use crate::model::Node;

const INPUT_TAGS: [&str; 4] = ["input", "button", "select", "textarea"];

/// The parts of a node view the filters need
#[derive(Clone, Copy)]
pub struct ViewFrame<'a> {
    pub tree: &'a HostTree,
    pub dom: HostId,
    pub content_dom: Option<HostId>,
    pub node: &'a Node,
    pub editor_focused: bool,
}

impl ViewFrame<'_> {
    fn in_content(&self, target: HostId) -> bool {
        self.content_dom
            .is_some_and(|content| self.tree.contains(content, target))
    }
}

/// Whether the view handles `event` itself instead of the document engine.
///
/// Drag events on selectable nodes that are not draggable have their default
/// prevented, since the engine would otherwise start dragging them anyway.
pub fn stop_event(frame: &ViewFrame<'_>, event: &mut HostEvent) -> bool {
    let target = event.target;
    let in_element = frame.tree.contains(frame.dom, target) && !frame.in_content(target);
    if !in_element {
        return false;
    }

    let is_input =
        INPUT_TAGS.contains(&frame.tree.tag(target)) || frame.tree.is_content_editable(target);
    if is_input && event.kind != EventKind::Drop {
        return true;
    }

    let spec = frame.node.spec();
    if !spec.draggable && spec.selectable && event.kind.is_drag() {
        event.prevent_default();
    }

    if event.kind.is_transfer() || (event.kind == EventKind::MouseDown && spec.selectable) {
        return false;
    }

    true
}

/// Whether the document engine should ignore an observed mutation
pub fn ignore_mutation(frame: &ViewFrame<'_>, mutation: &HostMutation) -> bool {
    let Some(content_dom) = frame.content_dom else {
        return true;
    };

    if frame.node.is_leaf() || frame.node.is_atom() {
        return true;
    }

    if mutation.kind == MutationKind::Selection {
        return false;
    }

    // Engine-driven churn while editing: everything added or removed is
    // editable content. Unverified across IMEs, keep the heuristic as is.
    if let MutationKind::ChildList { added, removed } = &mutation.kind {
        let engine_churn = frame.tree.contains(frame.dom, mutation.target)
            && frame.editor_focused
            && added
                .iter()
                .chain(removed)
                .all(|node| frame.tree.is_content_editable(*node));
        if engine_churn {
            return false;
        }
    }

    if mutation.target == content_dom && matches!(mutation.kind, MutationKind::Attributes { .. }) {
        return true;
    }

    if frame.tree.contains(content_dom, mutation.target) {
        return false;
    }

    true
}
