use std::ops::Range;

use crate::error::EditorError;
use crate::model::mapping::{Assoc, Mapping};
use crate::model::node::Node;

/// The editor's current selection
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Text range between `anchor` and `head`, in either direction
    Text { anchor: usize, head: usize },
    /// One whole node starting at `from`
    Node { from: usize, node: Node },
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Selection::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    /// Whole-node selection of the node starting at `pos` in `doc`
    pub fn node_at(doc: &Node, pos: usize) -> Result<Self, EditorError> {
        doc.node_at(pos)
            .map(|node| Selection::Node { from: pos, node })
            .ok_or(EditorError::NoNodeAt(pos))
    }

    pub fn from(&self) -> usize {
        match self {
            Selection::Text { anchor, head } => (*anchor).min(*head),
            Selection::Node { from, .. } => *from,
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Selection::Text { anchor, head } => (*anchor).max(*head),
            Selection::Node { from, node } => from + node.node_size(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.from()..self.to()
    }

    pub fn is_node_selection(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }

    pub fn selected_node(&self) -> Option<&Node> {
        match self {
            Selection::Node { node, .. } => Some(node),
            Selection::Text { .. } => None,
        }
    }

    /// Check the selection against `doc`, refreshing a selected node to the
    /// one actually found there
    pub fn resolve(&self, doc: &Node) -> Result<Self, EditorError> {
        let size = doc.content_size();
        match self {
            Selection::Text { anchor, head } => {
                if let Some(pos) = [*anchor, *head].into_iter().find(|pos| *pos > size) {
                    return Err(EditorError::PositionOutOfRange { pos, size });
                }
                Ok(self.clone())
            }
            Selection::Node { from, .. } => Self::node_at(doc, *from),
        }
    }

    /// Carry the selection through `mapping` into `doc`.
    ///
    /// A node selection whose node was deleted collapses to a cursor where the
    /// node used to be.
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Self {
        let size = doc.content_size();
        match self {
            Selection::Text { anchor, head } => Selection::Text {
                anchor: mapping.map(*anchor, Assoc::After).min(size),
                head: mapping.map(*head, Assoc::After).min(size),
            },
            Selection::Node { from, .. } => {
                let mapped = mapping.map_result(*from, Assoc::After);
                let pos = mapped.pos.min(size);
                if mapped.deleted {
                    return Selection::cursor(pos);
                }
                Self::node_at(doc, pos).unwrap_or_else(|_| Selection::cursor(pos))
            }
        }
    }
}
