//! Keeping live node views in step with the document.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::editor::{EditorInner, ViewEntry};
use crate::error::EditorError;
use crate::host::{CONTENT_EDITABLE_ATTR, HostEvent, HostId, HostMutation};
use crate::model::{Assoc, Mapping, Node, Selection};
use crate::view::{NodeViewBehavior, NodeViewFactory, PositionResolver};

/// Host elements a container should hold, in document order
type Mounts = Vec<(HostId, Vec<HostId>)>;

impl EditorInner {
    /// Carry every view across `mapping`, then walk the new document to
    /// create views for nodes that lack one and put their elements in order.
    ///
    /// A view survives when its node still starts at the mapped position and
    /// accepts the new version of the node; everything else is destroyed.
    pub(super) fn reconcile(&self, mapping: &Mapping) -> Result<(), EditorError> {
        let doc = self.current_state().doc;
        let previous = std::mem::take(&mut *self.views.borrow_mut());

        let mut claimed: BTreeMap<usize, ViewEntry> = BTreeMap::new();
        let mut doomed = Vec::new();
        for mut entry in previous {
            match self.remap(&doc, mapping, &claimed, &mut entry) {
                Some(pos) => {
                    claimed.insert(pos, entry);
                }
                None => doomed.push(entry),
            }
        }
        let mut first_error = self.destroy_entries(doomed).err();

        let mut ordered = Vec::new();
        let mut mounts = Mounts::new();
        let mut top_level = Vec::new();
        self.collect_views(&doc, 0, &mut claimed, &mut ordered, &mut top_level, &mut mounts);
        mounts.push((self.root, top_level));

        // claimed but no longer reachable, e.g. under a node that lost its view
        let unvisited: Vec<ViewEntry> = claimed.into_values().collect();
        if let Err(err) = self.destroy_entries(unvisited) {
            first_error.get_or_insert(err);
        }

        self.place(&mounts);
        *self.views.borrow_mut() = ordered;
        first_error.map_or(Ok(()), Err)
    }

    /// New position for `entry`, or `None` when the view has to go
    fn remap(
        &self,
        doc: &Node,
        mapping: &Mapping,
        claimed: &BTreeMap<usize, ViewEntry>,
        entry: &mut ViewEntry,
    ) -> Option<usize> {
        let old_start = entry.pos.get()?;
        let start = mapping.map_result(old_start, Assoc::After);
        let end = mapping.map_result(old_start + entry.node.node_size(), Assoc::Before);
        if start.deleted || end.pos <= start.pos || claimed.contains_key(&start.pos) {
            return None;
        }

        let node = doc.node_at(start.pos)?;
        entry.pos.set(Some(start.pos));
        if node.ptr_eq(&entry.node) {
            return Some(start.pos);
        }

        let handled = match entry.view.try_borrow_mut() {
            Ok(mut view) => view.update(node.clone(), &[], &[]),
            Err(_) => {
                log::warn!("node view at {} busy, keeping it as is", start.pos);
                return Some(start.pos);
            }
        };
        if !handled {
            return None;
        }
        entry.node = node;
        Some(start.pos)
    }

    /// Pre-order walk over `parent`'s children whose content starts at
    /// `content_start`. Nodes without a view are transparent: their
    /// descendants' elements land in the same container.
    fn collect_views(
        &self,
        parent: &Node,
        content_start: usize,
        claimed: &mut BTreeMap<usize, ViewEntry>,
        ordered: &mut Vec<ViewEntry>,
        container: &mut Vec<HostId>,
        mounts: &mut Mounts,
    ) {
        let mut offset = content_start;
        for child in parent.children() {
            let pos = offset;
            offset += child.node_size();

            let Some(factory) = self.registry.get(child.type_name()) else {
                if !child.is_leaf() {
                    self.collect_views(child, pos + 1, claimed, ordered, container, mounts);
                }
                continue;
            };

            let entry = match claimed.remove(&pos) {
                Some(entry) => entry,
                None => self.create_view(factory, child, pos),
            };
            let parts = entry
                .view
                .try_borrow()
                .map(|view| (view.dom(), view.content_dom()))
                .ok();
            let Some((dom, content_dom)) = parts else {
                log::warn!("node view at {pos} busy, leaving it unplaced");
                ordered.push(entry);
                continue;
            };
            container.push(dom);
            ordered.push(entry);

            if let Some(content_dom) = content_dom {
                let mut inner = Vec::new();
                self.collect_views(child, pos + 1, claimed, ordered, &mut inner, mounts);
                mounts.push((content_dom, inner));
            }
        }
    }

    fn create_view(&self, factory: &NodeViewFactory, node: &Node, pos: usize) -> ViewEntry {
        let cell = Rc::new(Cell::new(Some(pos)));
        let get_pos: PositionResolver = {
            let cell = cell.clone();
            Rc::new(move || cell.get())
        };
        let view = factory(node.clone(), get_pos, self.handle());

        if let Ok(view) = view.try_borrow() {
            if view.content_dom().is_none() {
                let mut tree = self.host.borrow_mut();
                if !tree.has_attribute(view.dom(), CONTENT_EDITABLE_ATTR) {
                    tree.set_attribute(view.dom(), CONTENT_EDITABLE_ATTR, "false");
                }
            }
        }

        let id = self.next_view_id.get();
        self.next_view_id.set(id + 1);
        log::debug!("created `{}` node view at {pos}", node.type_name());
        ViewEntry {
            id,
            pos: cell,
            node: node.clone(),
            view,
        }
    }

    /// Re-append elements whose container holds them in the wrong order
    fn place(&self, mounts: &Mounts) {
        let mut tree = self.host.borrow_mut();
        for (container, doms) in mounts {
            let current: Vec<HostId> = tree
                .children(*container)
                .iter()
                .copied()
                .filter(|child| doms.contains(child))
                .collect();
            if current == *doms {
                continue;
            }
            for dom in doms {
                tree.append_child(*container, *dom);
            }
        }
    }

    /// Detach and destroy `entries`, reporting the first failure after
    /// attempting all of them
    pub(super) fn destroy_entries(&self, entries: Vec<ViewEntry>) -> Result<(), EditorError> {
        let mut first_error = None;
        for entry in entries {
            entry.pos.set(None);
            if self.selected_view.get() == Some(entry.id) {
                self.selected_view.set(None);
            }
            let result = match entry.view.try_borrow_mut() {
                Ok(mut view) => view.destroy(),
                Err(_) => {
                    log::warn!("node view busy, cannot destroy it");
                    Ok(())
                }
            };
            if let Err(err) = result {
                log::error!("failed to destroy `{}` node view: {err}", entry.node.type_name());
                first_error.get_or_insert(err.into());
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Tell the view under a node selection that it is selected, and the one
    /// that was selected before that it no longer is
    pub(super) fn sync_node_selection(&self) {
        let target = match self.current_selection() {
            Selection::Node { from, .. } => self
                .views
                .borrow()
                .iter()
                .find(|entry| entry.pos.get() == Some(from))
                .map(|entry| (entry.id, entry.view.clone())),
            Selection::Text { .. } => None,
        };

        let previous = self.selected_view.get();
        if previous == target.as_ref().map(|(id, _)| *id) {
            return;
        }

        if let Some(previous) = previous {
            let view = self
                .views
                .borrow()
                .iter()
                .find(|entry| entry.id == previous)
                .map(|entry| entry.view.clone());
            if let Some(view) = view {
                with_view(&view, |view| view.deselect_node());
            }
        }

        match target {
            Some((id, view)) => {
                with_view(&view, |view| view.select_node());
                self.selected_view.set(Some(id));
            }
            None => self.selected_view.set(None),
        }
    }

    /// Deepest live view whose element contains `target`
    fn innermost_view(&self, target: HostId) -> Option<Rc<RefCell<dyn NodeViewBehavior>>> {
        let tree = self.host.borrow();
        self.views
            .borrow()
            .iter()
            .filter_map(|entry| {
                let dom = entry.view.try_borrow().ok()?.dom();
                tree.contains(dom, target)
                    .then(|| (tree.depth(dom), entry.view.clone()))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, view)| view)
    }

    pub(super) fn route_event(&self, event: &mut HostEvent) -> bool {
        use crate::host::EventKind;

        if matches!(event.kind, EventKind::DragEnd | EventKind::Drop) {
            for view in self.live_views() {
                with_view(&view, |view| {
                    if view.is_dragging() {
                        view.end_drag();
                    }
                });
            }
            *self.dragging.borrow_mut() = None;
        }

        let Some(view) = self.innermost_view(event.target) else {
            return false;
        };
        let Ok(mut view) = view.try_borrow_mut() else {
            log::warn!("node view busy, cannot route `{}`", event.kind.name());
            return false;
        };
        // a declined drag of a draggable node stays with the engine
        if event.kind == EventKind::DragStart
            && !view.on_drag_start(event)
            && view.node().spec().draggable
        {
            return false;
        }
        view.stop_event(event)
    }

    pub(super) fn route_mutation(&self, mutation: &HostMutation) -> bool {
        let Some(view) = self.innermost_view(mutation.target) else {
            return false;
        };
        match view.try_borrow() {
            Ok(view) => view.ignore_mutation(mutation),
            Err(_) => false,
        }
    }
}

fn with_view(view: &Rc<RefCell<dyn NodeViewBehavior>>, f: impl FnOnce(&mut dyn NodeViewBehavior)) {
    match view.try_borrow_mut() {
        Ok(mut view) => f(&mut *view),
        Err(_) => log::warn!("node view busy, skipping selection sync"),
    }
}
