use std::ops::Range;

use crate::error::EditorError;
use crate::model::mapping::{Assoc, Mapping, StepMap};
use crate::model::node::{Attrs, Node};
use crate::model::patch::Patch;
use crate::model::selection::Selection;

/// A single document change, addressed in the document as it stands before
/// the step runs
#[derive(Debug, Clone)]
pub enum Step {
    /// Replace the attributes of the node at `pos`, keeping its content
    SetNodeMarkup { pos: usize, attrs: Attrs },
    Insert { pos: usize, nodes: Vec<Node> },
    Delete { from: usize, to: usize },
    /// Swap the node at `pos` for `node`
    ReplaceWith { pos: usize, node: Node },
}

struct StepResult {
    doc: Node,
    map: StepMap,
    changed: Range<usize>,
}

impl Step {
    fn apply(&self, doc: &Node) -> Result<StepResult, EditorError> {
        match self {
            Step::SetNodeMarkup { pos, attrs } => {
                let target = doc.node_at(*pos).ok_or(EditorError::NoNodeAt(*pos))?;
                let size = target.node_size();
                let doc = doc.replace_range(*pos, pos + size, &[target.with_attrs(attrs.clone())])?;
                Ok(StepResult {
                    doc,
                    map: StepMap::empty(),
                    changed: *pos..pos + size,
                })
            }
            Step::Insert { pos, nodes } => {
                let size: usize = nodes.iter().map(Node::node_size).sum();
                Ok(StepResult {
                    doc: doc.replace_range(*pos, *pos, nodes)?,
                    map: StepMap::replace(*pos, 0, size),
                    changed: *pos..pos + size,
                })
            }
            Step::Delete { from, to } => Ok(StepResult {
                doc: doc.replace_range(*from, *to, &[])?,
                map: StepMap::replace(*from, to.saturating_sub(*from), 0),
                changed: *from..*from,
            }),
            Step::ReplaceWith { pos, node } => {
                let target = doc.node_at(*pos).ok_or(EditorError::NoNodeAt(*pos))?;
                let old_size = target.node_size();
                let new_size = node.node_size();
                Ok(StepResult {
                    doc: doc.replace_range(*pos, pos + old_size, std::slice::from_ref(node))?,
                    map: StepMap::replace(*pos, old_size, new_size),
                    changed: *pos..pos + new_size,
                })
            }
        }
    }
}

/// Flags attached to a transaction, read by the editor after applying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMeta {
    /// Record the change in undo history
    pub add_to_history: bool,
    /// Skip the `update` notification for this change
    pub prevent_update: bool,
    /// Re-render every live node view after applying
    pub force_update: bool,
}

impl Default for TransactionMeta {
    fn default() -> Self {
        Self {
            add_to_history: true,
            prevent_update: false,
            force_update: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
    meta: TransactionMeta,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn set_node_markup(self, pos: usize, attrs: Attrs) -> Self {
        self.step(Step::SetNodeMarkup { pos, attrs })
    }

    pub fn insert(self, pos: usize, nodes: Vec<Node>) -> Self {
        self.step(Step::Insert { pos, nodes })
    }

    pub fn delete(self, from: usize, to: usize) -> Self {
        self.step(Step::Delete { from, to })
    }

    pub fn replace_with(self, pos: usize, node: Node) -> Self {
        self.step(Step::ReplaceWith { pos, node })
    }

    pub fn set_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn add_to_history(mut self, add_to_history: bool) -> Self {
        self.meta.add_to_history = add_to_history;
        self
    }

    pub fn prevent_update(mut self, prevent_update: bool) -> Self {
        self.meta.prevent_update = prevent_update;
        self
    }

    pub fn force_update(mut self, force_update: bool) -> Self {
        self.meta.force_update = force_update;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn meta(&self) -> TransactionMeta {
        self.meta
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Document and selection at one version
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Node,
    pub selection: Selection,
    pub version: u64,
}

/// Outcome of [`EditorState::apply`]
#[derive(Debug, Clone)]
pub struct Applied {
    pub state: EditorState,
    pub mapping: Mapping,
    pub patch: Patch,
}

impl EditorState {
    pub fn new(doc: Node) -> Self {
        Self {
            doc,
            selection: Selection::cursor(0),
            version: 0,
        }
    }

    /// Apply every step in order, then settle the selection.
    ///
    /// Nothing is applied when any step fails.
    pub fn apply(&self, tr: &Transaction) -> Result<Applied, EditorError> {
        let mut doc = self.doc.clone();
        let mut mapping = Mapping::new();
        let mut changed: Vec<Range<usize>> = Vec::new();

        for step in tr.steps() {
            let result = step.apply(&doc)?;
            for range in &mut changed {
                *range = result.map.map(range.start, Assoc::Before)
                    ..result.map.map(range.end, Assoc::After);
            }
            changed.push(result.changed);
            mapping.append(result.map);
            doc = result.doc;
        }

        let selection = match tr.selection() {
            Some(selection) => selection.resolve(&doc)?,
            None if tr.doc_changed() => self.selection.map(&doc, &mapping),
            None => self.selection.clone(),
        };
        let version = if tr.doc_changed() {
            self.version + 1
        } else {
            self.version
        };

        let patch = Patch {
            changed,
            new_selection: selection.range(),
            version,
        };
        Ok(Applied {
            state: EditorState {
                doc,
                selection,
                version,
            },
            mapping,
            patch,
        })
    }
}
