use std::rc::{Rc, Weak};

use nodeview_config::Platform;
use uuid::Uuid;

use crate::dispatcher::Listener;
use crate::editor::EditorInner;
use crate::error::EditorError;
use crate::model::{EditorState, Patch, Selection, Transaction};
use crate::view::Dragging;

/// Non-owning handle to an [`Editor`](crate::editor::Editor), passed to node
/// views and hosted components.
///
/// Every accessor degrades gracefully once the editor has been dropped.
#[derive(Clone)]
pub struct EditorHandle {
    id: Uuid,
    inner: Weak<EditorInner>,
}

impl EditorHandle {
    pub(crate) fn new(id: Uuid, inner: Weak<EditorInner>) -> Self {
        Self { id, inner }
    }

    fn inner(&self) -> Option<Rc<EditorInner>> {
        self.inner.upgrade()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Channel notified after every transaction that moved the selection or
    /// changed the document
    pub fn selection_channel(&self) -> String {
        format!("selection-change:{}", self.id)
    }

    /// Channel notified after document changes
    pub fn update_channel(&self) -> String {
        format!("update:{}", self.id)
    }

    pub fn state(&self) -> Option<EditorState> {
        self.inner().map(|inner| inner.current_state())
    }

    pub fn selection(&self) -> Option<Selection> {
        self.inner().map(|inner| inner.current_selection())
    }

    pub fn is_editable(&self) -> bool {
        self.inner().is_some_and(|inner| inner.editable.get())
    }

    pub fn is_focused(&self) -> bool {
        self.inner().is_some_and(|inner| inner.focused.get())
    }

    pub fn blur(&self) {
        if let Some(inner) = self.inner() {
            inner.focused.set(false);
        }
    }

    pub fn platform(&self) -> Platform {
        self.inner()
            .map(|inner| inner.options.platform)
            .unwrap_or_default()
    }

    /// Queue `tr` and apply it once the editor is idle
    pub fn dispatch(&self, tr: Transaction) -> Result<(), EditorError> {
        let inner = self.inner().ok_or(EditorError::EditorGone)?;
        inner.dispatch(tr)
    }

    pub fn set_dragging(&self, dragging: Option<Dragging>) {
        if let Some(inner) = self.inner() {
            *inner.dragging.borrow_mut() = dragging;
        }
    }

    pub fn dragging(&self) -> Option<Dragging> {
        self.inner().and_then(|inner| inner.current_dragging())
    }

    pub fn on(&self, channel: &str, listener: Listener<Patch>) {
        if let Some(inner) = self.inner() {
            inner.dispatcher.on(channel, listener);
        }
    }

    pub fn off(&self, channel: &str, listener: &Listener<Patch>) {
        if let Some(inner) = self.inner() {
            inner.dispatcher.off(channel, listener);
        }
    }
}

impl std::fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
