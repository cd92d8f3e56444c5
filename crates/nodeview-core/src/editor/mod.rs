//! The editing surface that drives node views.
//!
//! The editor owns the [`EditorState`], the host element the document is
//! rendered under, and every live node view. Transactions go through a FIFO
//! queue: one dispatched while another is being applied (from a view update,
//! a listener or an event handler) waits its turn, so views always see
//! changes one at a time and in order.

pub mod handle;
mod sync;

pub use handle::EditorHandle;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use nodeview_config::{Config, Platform};
use uuid::Uuid;

use crate::dispatcher::{EventDispatcher, Listener};
use crate::error::EditorError;
use crate::host::{CONTENT_EDITABLE_ATTR, HostEvent, HostHandle, HostId, HostMutation};
use crate::model::{EditorState, Mapping, Node, Patch, Selection, Transaction};
use crate::view::{Dragging, NodeViewBehavior, NodeViewRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    pub editable: bool,
    pub platform: Platform,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            editable: true,
            platform: Platform::Desktop,
        }
    }
}

impl From<&Config> for EditorOptions {
    fn from(config: &Config) -> Self {
        Self {
            editable: config.editor.editable,
            platform: config.editor.platform,
        }
    }
}

/// A live view and the bookkeeping the editor keeps for it
pub(crate) struct ViewEntry {
    pub(crate) id: u64,
    /// Backs the view's position resolver; `None` once the view is gone
    pub(crate) pos: Rc<Cell<Option<usize>>>,
    /// Last node handed to the view
    pub(crate) node: Node,
    pub(crate) view: Rc<RefCell<dyn NodeViewBehavior>>,
}

pub(crate) struct EditorInner {
    pub(crate) id: Uuid,
    pub(crate) state: RefCell<EditorState>,
    pub(crate) options: EditorOptions,
    pub(crate) editable: Cell<bool>,
    pub(crate) focused: Cell<bool>,
    pub(crate) dragging: RefCell<Option<Dragging>>,
    pub(crate) dispatcher: EventDispatcher<Patch>,
    host: HostHandle,
    root: HostId,
    registry: NodeViewRegistry,
    views: RefCell<Vec<ViewEntry>>,
    queue: RefCell<VecDeque<Transaction>>,
    busy: Cell<bool>,
    history: RefCell<Vec<EditorState>>,
    selected_view: Cell<Option<u64>>,
    next_view_id: Cell<u64>,
    destroyed: Cell<bool>,
    self_ref: Weak<EditorInner>,
}

impl EditorInner {
    pub(crate) fn current_state(&self) -> EditorState {
        self.state.borrow().clone()
    }

    pub(crate) fn current_selection(&self) -> Selection {
        self.state.borrow().selection.clone()
    }

    pub(crate) fn current_dragging(&self) -> Option<Dragging> {
        self.dragging.borrow().clone()
    }

    fn handle(&self) -> EditorHandle {
        EditorHandle::new(self.id, self.self_ref.clone())
    }

    fn selection_channel(&self) -> String {
        format!("selection-change:{}", self.id)
    }

    fn update_channel(&self) -> String {
        format!("update:{}", self.id)
    }

    pub(crate) fn dispatch(&self, tr: Transaction) -> Result<(), EditorError> {
        if self.destroyed.get() {
            return Err(EditorError::EditorGone);
        }
        self.queue.borrow_mut().push_back(tr);
        self.drain()
    }

    /// Apply queued transactions until the queue is empty, unless something
    /// further up the stack is already doing so
    fn drain(&self) -> Result<(), EditorError> {
        if self.busy.replace(true) {
            return Ok(());
        }
        let mut first_error = None;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(tr) = next else {
                break;
            };
            if let Err(err) = self.apply_transaction(tr) {
                log::error!("transaction failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        self.busy.set(false);
        first_error.map_or(Ok(()), Err)
    }

    fn with_busy<T>(&self, f: impl FnOnce() -> T) -> T {
        let was_busy = self.busy.replace(true);
        let result = f();
        self.busy.set(was_busy);
        result
    }

    fn apply_transaction(&self, tr: Transaction) -> Result<(), EditorError> {
        let before = self.current_state();
        let applied = before.apply(&tr)?;
        *self.state.borrow_mut() = applied.state.clone();

        let meta = tr.meta();
        let doc_changed = tr.doc_changed();
        if doc_changed && meta.add_to_history {
            self.history.borrow_mut().push(before.clone());
        }

        let mut first_error = None;
        if doc_changed {
            if let Err(err) = self.reconcile(&applied.mapping) {
                first_error.get_or_insert(err);
            }
        }
        self.sync_node_selection();
        if meta.force_update {
            self.force_render_views();
        }

        if doc_changed || before.selection != applied.state.selection {
            if let Err(err) = self.dispatcher.emit(&self.selection_channel(), &applied.patch) {
                first_error.get_or_insert(err.into());
            }
        }
        if doc_changed && !meta.prevent_update {
            if let Err(err) = self.dispatcher.emit(&self.update_channel(), &applied.patch) {
                first_error.get_or_insert(err.into());
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn live_views(&self) -> Vec<Rc<RefCell<dyn NodeViewBehavior>>> {
        self.views
            .borrow()
            .iter()
            .map(|entry| entry.view.clone())
            .collect()
    }

    fn force_render_views(&self) {
        for view in self.live_views() {
            match view.try_borrow_mut() {
                Ok(mut view) => view.force_render(),
                Err(_) => log::warn!("node view busy, skipping forced render"),
            }
        }
    }
}

/// Editing surface hosting node views for the registered node types
pub struct Editor {
    inner: Rc<EditorInner>,
}

impl Editor {
    /// Create the editor root under the host tree's root and build views for
    /// `doc`
    pub fn new(
        doc: Node,
        host: HostHandle,
        registry: NodeViewRegistry,
        options: EditorOptions,
    ) -> Self {
        let root = {
            let mut tree = host.borrow_mut();
            let root = tree.create_element("div");
            tree.add_class(root, "nodeview-editor");
            tree.set_attribute(root, CONTENT_EDITABLE_ATTR, &options.editable.to_string());
            let body = tree.root();
            tree.append_child(body, root);
            root
        };

        let inner = Rc::new_cyclic(|self_ref| EditorInner {
            id: Uuid::new_v4(),
            state: RefCell::new(EditorState::new(doc)),
            editable: Cell::new(options.editable),
            options,
            focused: Cell::new(false),
            dragging: RefCell::new(None),
            dispatcher: EventDispatcher::new(),
            host,
            root,
            registry,
            views: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            busy: Cell::new(false),
            history: RefCell::new(Vec::new()),
            selected_view: Cell::new(None),
            next_view_id: Cell::new(0),
            destroyed: Cell::new(false),
            self_ref: self_ref.clone(),
        });

        if let Err(err) = inner.with_busy(|| inner.reconcile(&Mapping::new())) {
            log::error!("failed to build initial node views: {err}");
        }
        if let Err(err) = inner.drain() {
            log::error!("failed to apply transactions queued during setup: {err}");
        }
        Self { inner }
    }

    pub fn handle(&self) -> EditorHandle {
        self.inner.handle()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Host element the document is rendered under
    pub fn root(&self) -> HostId {
        self.inner.root
    }

    pub fn state(&self) -> EditorState {
        self.inner.current_state()
    }

    pub fn doc(&self) -> Node {
        self.inner.current_state().doc
    }

    pub fn selection(&self) -> Selection {
        self.inner.current_selection()
    }

    pub fn dispatch(&self, tr: Transaction) -> Result<(), EditorError> {
        self.inner.dispatch(tr)
    }

    pub fn set_selection(&self, selection: Selection) -> Result<(), EditorError> {
        self.dispatch(Transaction::new().set_selection(selection))
    }

    pub fn on(&self, channel: &str, listener: Listener<Patch>) {
        self.inner.dispatcher.on(channel, listener);
    }

    pub fn off(&self, channel: &str, listener: &Listener<Patch>) {
        self.inner.dispatcher.off(channel, listener);
    }

    pub fn selection_channel(&self) -> String {
        self.inner.selection_channel()
    }

    pub fn update_channel(&self) -> String {
        self.inner.update_channel()
    }

    pub fn is_editable(&self) -> bool {
        self.inner.editable.get()
    }

    /// Toggle editability and re-render every view so `selected` props follow
    pub fn set_editable(&self, editable: bool) {
        if self.inner.editable.replace(editable) == editable {
            return;
        }
        self.inner.host.borrow_mut().set_attribute(
            self.inner.root,
            CONTENT_EDITABLE_ATTR,
            &editable.to_string(),
        );
        self.inner.force_render_views();
    }

    pub fn focus(&self) {
        self.inner.focused.set(true);
    }

    pub fn blur(&self) {
        self.inner.focused.set(false);
    }

    pub fn is_focused(&self) -> bool {
        self.inner.focused.get()
    }

    pub fn dragging(&self) -> Option<Dragging> {
        self.inner.current_dragging()
    }

    /// Number of document versions recorded for undo
    pub fn history_len(&self) -> usize {
        self.inner.history.borrow().len()
    }

    pub fn view_count(&self) -> usize {
        self.inner.views.borrow().len()
    }

    /// Live views with their current positions, in document order
    pub fn views(&self) -> Vec<(usize, Rc<RefCell<dyn NodeViewBehavior>>)> {
        self.inner
            .views
            .borrow()
            .iter()
            .filter_map(|entry| entry.pos.get().map(|pos| (pos, entry.view.clone())))
            .collect()
    }

    pub fn view_at(&self, pos: usize) -> Option<Rc<RefCell<dyn NodeViewBehavior>>> {
        self.inner
            .views
            .borrow()
            .iter()
            .find(|entry| entry.pos.get() == Some(pos))
            .map(|entry| entry.view.clone())
    }

    /// Route a host event to the innermost view under its target.
    ///
    /// Returns whether that view stopped the event. Transactions dispatched
    /// while handling it are applied afterwards.
    pub fn handle_event(&self, event: &mut HostEvent) -> Result<bool, EditorError> {
        let stopped = self.inner.with_busy(|| self.inner.route_event(event));
        self.inner.drain()?;
        Ok(stopped)
    }

    /// Whether the innermost view under the mutation's target ignores it.
    /// Mutations outside every view belong to the document engine.
    pub fn handle_mutation(&self, mutation: &HostMutation) -> bool {
        self.inner.route_mutation(mutation)
    }

    /// Destroy every view and stop notifying listeners
    pub fn destroy(&self) -> Result<(), EditorError> {
        if self.inner.destroyed.replace(true) {
            return Ok(());
        }
        let entries = std::mem::take(&mut *self.inner.views.borrow_mut());
        let result = self.inner.destroy_entries(entries);
        self.inner.dispatcher.destroy();
        self.inner.queue.borrow_mut().clear();
        result
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::error!("failed to tear down editor {}: {err}", self.inner.id);
        }
    }
}
