//! Selection-aware re-rendering.
//!
//! A selection-aware view re-renders whenever the selection moves relative to
//! its span, even if its node did not change. Spans are `[pos, pos_end)` and
//! are recomputed from the position resolver before any containment test.

use crate::model::{Node, Selection};
use crate::view::node_view::{SyncStrategy, ViewState};

/// The node's span lies within `from..to`; touching edges count
pub fn is_node_inside_selection(from: usize, to: usize, pos: usize, pos_end: usize) -> bool {
    from <= pos && to >= pos_end
}

/// The selection lies strictly within the node's span
pub fn is_selection_inside_node(from: usize, to: usize, pos: usize, pos_end: usize) -> bool {
    pos < from && to < pos_end
}

/// Whole-node selection of exactly this node
pub fn is_selected_node(selection: &Selection, node: &Node, pos: usize, pos_end: usize) -> bool {
    match selection {
        Selection::Node {
            from,
            node: selected,
        } => {
            selected.ptr_eq(node)
                || (pos == *from && pos_end == selection.to() && selected == node)
        }
        Selection::Text { .. } => false,
    }
}

fn targets_node_at(selection: &Selection, pos: usize) -> bool {
    selection.is_node_selection() && selection.from() == pos
}

/// Whether a view spanning `pos..pos_end` should render as selected
pub fn selection_covers(selection: &Selection, node: &Node, pos: usize, pos_end: usize) -> bool {
    let (from, to) = (selection.from(), selection.to());
    is_selected_node(selection, node, pos, pos_end)
        || is_selection_inside_node(from, to, pos, pos_end)
        || is_node_inside_selection(from, to, pos, pos_end)
}

pub(crate) struct SelectionStrategy {
    previous: Selection,
}

impl SelectionStrategy {
    pub(crate) fn new(initial: Selection) -> Self {
        Self { previous: initial }
    }
}

impl SyncStrategy for SelectionStrategy {
    fn view_should_update(&mut self, state: &mut ViewState, next: &Node) -> bool {
        let inherited = match &state.should_update {
            Some(should_update) => should_update(&state.node, next),
            None => state.node != *next,
        };

        let Some(selection) = state.editor.selection() else {
            return inherited;
        };
        let previous = std::mem::replace(&mut self.previous, selection.clone());
        let old_span = state.span();
        state.update_pos_for(next);

        if inherited {
            return true;
        }
        let Some((pos, pos_end)) = state.span() else {
            return false;
        };

        if next.spec().selectable && targets_node_at(&selection, pos) != targets_node_at(&previous, pos) {
            return true;
        }

        let (from, to) = (selection.from(), selection.to());
        let (old_from, old_to) = (previous.from(), previous.to());

        let moved_inside_node = is_selection_inside_node(from, to, pos, pos_end)
            != is_selection_inside_node(old_from, old_to, pos, pos_end);
        let moved_across_node = is_node_inside_selection(from, to, pos, pos_end)
            != is_node_inside_selection(old_from, old_to, pos, pos_end);
        let moved_out_from_old_span = old_span.is_some_and(|(old_pos, old_end)| {
            is_node_inside_selection(from, to, old_pos, old_end)
                && !is_node_inside_selection(from, to, pos, pos_end)
        });

        moved_inside_node || moved_across_node || moved_out_from_old_span
    }

    fn selected(&self, state: &ViewState) -> bool {
        if !state.editor.is_editable() {
            return false;
        }
        let (Some(selection), Some((pos, pos_end))) = (state.editor.selection(), state.span())
        else {
            return false;
        };
        selection_covers(&selection, &state.node, pos, pos_end)
    }

    fn renders_on_select(&self) -> bool {
        false
    }
}
