use std::rc::Rc;

use crate::dispatcher::Listener;
use crate::editor::EditorHandle;
use crate::error::{EditorError, PortalError};
use crate::host::{ForwardRef, HostEvent, HostHandle, HostId, HostMutation, HostTree};
use crate::model::{Attrs, Node, Patch, Selection, Transaction};
use crate::portal::{DeferredRemovals, PortalHandle, PortalHost, RenderFn};
use crate::view::drag::{
    DRAG_HANDLE_ATTR, DRAG_IMAGE_ATTR, Dragging, drag_image_offset, fill_data_transfer,
    serialize_for_clipboard,
};
use crate::view::filter::{self, ViewFrame};
use crate::view::props::{
    AttributeUpdater, Component, NodeViewProps, PositionResolver, UpdateOptions,
};
use crate::view::{ContentDom, Decoration, NodeViewBehavior, NodeViewOptions};

/// Decides whether a node change needs a re-render
pub type ShouldUpdate = Rc<dyn Fn(&Node, &Node) -> bool>;

/// Per-view synchronisation state shared by every strategy
pub(crate) struct ViewState {
    pub(crate) node: Node,
    pub(crate) get_pos: PositionResolver,
    pub(crate) editor: EditorHandle,
    pub(crate) pos: Option<usize>,
    pub(crate) pos_end: Option<usize>,
    pub(crate) selected: bool,
    pub(crate) should_update: Option<ShouldUpdate>,
}

impl ViewState {
    pub(crate) fn update_pos(&mut self) {
        let size = self.node.node_size();
        self.pos = (self.get_pos)();
        self.pos_end = self.pos.map(|pos| pos + size);
    }

    /// Refresh the span for a node that is about to replace the current one
    pub(crate) fn update_pos_for(&mut self, next: &Node) {
        self.pos = (self.get_pos)();
        self.pos_end = self.pos.map(|pos| pos + next.node_size());
    }

    pub(crate) fn span(&self) -> Option<(usize, usize)> {
        self.pos.zip(self.pos_end)
    }
}

/// The part of a node view that differs between plain and selection-aware
/// views
pub(crate) trait SyncStrategy {
    fn view_should_update(&mut self, state: &mut ViewState, next: &Node) -> bool;

    /// Value of the `selected` prop
    fn selected(&self, state: &ViewState) -> bool;

    /// Whether `select_node`/`deselect_node` trigger a render
    fn renders_on_select(&self) -> bool;
}

pub(crate) struct BaseStrategy;

impl SyncStrategy for BaseStrategy {
    fn view_should_update(&mut self, state: &mut ViewState, next: &Node) -> bool {
        match &state.should_update {
            Some(should_update) => should_update(&state.node, next),
            None => true,
        }
    }

    fn selected(&self, state: &ViewState) -> bool {
        state.selected
    }

    fn renders_on_select(&self) -> bool {
        true
    }
}

/// One document node rendered through a portal.
///
/// The view owns its mount point (`dom`) and, for mixed-ownership nodes, a
/// content element the document engine keeps editing directly.
pub struct NodeView<H: PortalHost> {
    state: ViewState,
    strategy: Box<dyn SyncStrategy>,
    portal: PortalHandle<H>,
    deferred: DeferredRemovals,
    tree: HostHandle,
    component: Component<H::Element>,
    dom: HostId,
    content_dom: Option<HostId>,
    content_wrapper: Option<HostId>,
    subscription: Option<(String, Listener<Patch>)>,
    is_dragging: bool,
    destroyed: bool,
}

impl<H: PortalHost + 'static> NodeView<H> {
    pub(crate) fn init(
        node: Node,
        get_pos: PositionResolver,
        editor: EditorHandle,
        options: &NodeViewOptions<H>,
        strategy: Box<dyn SyncStrategy>,
    ) -> Self {
        let (tree, deferred) = {
            let portal = options.portal.borrow();
            (portal.tree().clone(), portal.deferred_removals())
        };
        let (dom, content_dom, content_wrapper) = {
            let mut tree = tree.borrow_mut();
            Self::create_dom(&mut tree, &node, options)
        };

        let mut view = Self {
            state: ViewState {
                node,
                get_pos,
                editor,
                pos: None,
                pos_end: None,
                selected: false,
                should_update: options.should_update.clone(),
            },
            strategy,
            portal: options.portal.clone(),
            deferred,
            tree,
            component: options.component.clone(),
            dom,
            content_dom,
            content_wrapper,
            subscription: None,
            is_dragging: false,
            destroyed: false,
        };
        view.state.update_pos();
        view.render();
        view
    }

    fn create_dom(
        tree: &mut HostTree,
        node: &Node,
        options: &NodeViewOptions<H>,
    ) -> (HostId, Option<HostId>, Option<HostId>) {
        let dom = match &options.wrapper {
            Some(wrapper) => wrapper(tree, node),
            None if node.is_inline() => tree.create_element("span"),
            None => tree.create_element("div"),
        };

        let parts = match &options.content_dom {
            ContentDom::None => None,
            ContentDom::Default => {
                let content = tree.create_element("div");
                tree.add_class(
                    content,
                    &format!("{}-content-wrapper", node.type_name().to_lowercase()),
                );
                tree.set_style(content, "white-space", "inherit");
                // the caret disappears in a zero-width content element
                tree.set_style(content, "min-width", "20px");
                Some((content, None))
            }
            ContentDom::Custom(factory) => {
                factory(tree, node).map(|parts| (parts.dom, parts.content_dom))
            }
        };

        let (content_dom, content_wrapper) = match parts {
            Some((wrapper, content)) => {
                tree.append_child(dom, wrapper);
                (Some(content.unwrap_or(wrapper)), Some(wrapper))
            }
            None => (None, None),
        };

        tree.add_class(dom, &format!("{}-view-content-wrap", node.type_name()));
        (dom, content_dom, content_wrapper)
    }

    pub(crate) fn subscribe(&mut self, channel: String, listener: Listener<Patch>) {
        self.state.editor.on(&channel, listener.clone());
        self.subscription = Some((channel, listener));
    }

    /// Re-run the update path with the current node, so the strategy can react
    /// to editor state that changed without touching this node
    pub fn refresh(&mut self) {
        let node = self.state.node.clone();
        self.update(node, &[], &[]);
    }

    pub fn props(&self) -> NodeViewProps {
        NodeViewProps {
            node: self.state.node.clone(),
            pos: self.state.pos,
            selected: self.strategy.selected(&self.state),
            editor: self.state.editor.clone(),
            get_pos: self.state.get_pos.clone(),
            update_attributes: attribute_updater(&self.state.editor, &self.state.get_pos),
            forward_ref: content_forward_ref(self.content_wrapper),
        }
    }

    /// Merge `attrs` onto the node currently at this view's position
    pub fn update_attributes(&self, attrs: Attrs, options: UpdateOptions) -> Result<(), EditorError> {
        update_attributes(&self.state.editor, &self.state.get_pos, attrs, options)
    }

    fn render(&mut self) {
        if self.destroyed {
            return;
        }
        let props = self.props();
        let component = self.component.clone();
        let render_fn: RenderFn<H::Element> = Rc::new(move || component(&props));

        let result = match self.portal.try_borrow_mut() {
            Ok(mut portal) => portal.render(render_fn, self.dom),
            Err(_) => {
                log::warn!(
                    "portal busy, skipping render of `{}` node view",
                    self.state.node.type_name()
                );
                return;
            }
        };
        if let Err(err) = result {
            log::error!(
                "failed to render `{}` node view: {err}",
                self.state.node.type_name()
            );
        }
    }

    fn frame<'a>(&'a self, tree: &'a HostTree) -> ViewFrame<'a> {
        ViewFrame {
            tree,
            dom: self.dom,
            content_dom: self.content_dom,
            node: &self.state.node,
            editor_focused: self.state.editor.is_focused(),
        }
    }
}

impl<H: PortalHost + 'static> NodeViewBehavior for NodeView<H> {
    fn dom(&self) -> HostId {
        self.dom
    }

    fn content_dom(&self) -> Option<HostId> {
        self.content_dom
    }

    fn node(&self) -> &Node {
        &self.state.node
    }

    fn update(&mut self, node: Node, _decorations: &[Decoration], _inner: &[Decoration]) -> bool {
        if self.destroyed || !self.state.node.same_type(&node) {
            return false;
        }

        if !self.strategy.view_should_update(&mut self.state, &node) {
            self.state.node = node;
            return true;
        }

        self.state.node = node;
        self.state.update_pos();
        self.render();
        true
    }

    fn select_node(&mut self) {
        self.state.selected = true;
        if self.strategy.renders_on_select() {
            self.render();
        }
    }

    fn deselect_node(&mut self) {
        self.state.selected = false;
        if self.strategy.renders_on_select() {
            self.render();
        }
    }

    fn is_selected(&self) -> bool {
        self.state.selected
    }

    fn stop_event(&mut self, event: &mut HostEvent) -> bool {
        let tree = self.tree.borrow();
        filter::stop_event(&self.frame(&tree), event)
    }

    fn ignore_mutation(&self, mutation: &HostMutation) -> bool {
        let tree = self.tree.borrow();
        filter::ignore_mutation(&self.frame(&tree), mutation)
    }

    fn on_drag_start(&mut self, event: &mut HostEvent) -> bool {
        if self.destroyed || !self.state.node.spec().draggable {
            return false;
        }

        let (image, offset) = {
            let tree = self.tree.borrow();
            let Some(handle) = tree.query_attr(self.dom, DRAG_HANDLE_ATTR) else {
                return false;
            };
            let in_content = self
                .content_dom
                .is_some_and(|content| tree.contains(content, event.target));
            let from_handle = tree.contains(self.dom, event.target)
                && tree
                    .closest_attr(event.target, DRAG_HANDLE_ATTR, self.dom)
                    .is_some();
            if in_content || !from_handle {
                return false;
            }
            let image = tree.query_attr(self.dom, DRAG_IMAGE_ATTR).unwrap_or(self.dom);
            (image, drag_image_offset(&tree, handle, image, event))
        };

        let editor = self.state.editor.clone();
        let Some(pos) = (self.state.get_pos)() else {
            return false;
        };
        let Some(state) = editor.state() else {
            return false;
        };
        let selection = match Selection::node_at(&state.doc, pos) {
            Ok(selection) => selection,
            Err(err) => {
                log::warn!("cannot select dragged node: {err}");
                return false;
            }
        };

        let mobile = editor.platform().is_mobile();
        if mobile {
            // keeps the on-screen keyboard from opening mid-drag
            editor.blur();
        }

        if let Err(err) = editor.dispatch(Transaction::new().set_selection(selection)) {
            log::error!("failed to select dragged node: {err}");
        }

        if let Some(transfer) = event.data_transfer.as_mut() {
            fill_data_transfer(transfer, &serialize_for_clipboard(&self.state.node));
            editor.set_dragging(Some(Dragging {
                slice: self.state.node.clone(),
                is_move: true,
                node_view: mobile,
            }));
            transfer.set_drag_image(image, offset.0, offset.1);
        }

        self.is_dragging = true;
        true
    }

    fn end_drag(&mut self) {
        self.is_dragging = false;
    }

    fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    fn force_render(&mut self) {
        self.state.update_pos();
        self.render();
    }

    fn destroy(&mut self) -> Result<(), PortalError> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;

        if let Some((channel, listener)) = self.subscription.take() {
            self.state.editor.off(&channel, &listener);
        }

        let removed = match self.portal.try_borrow_mut() {
            Ok(mut portal) => portal.remove(self.dom),
            Err(_) => {
                log::debug!("portal busy, deferring release of {:?}", self.dom);
                self.deferred.defer(self.dom);
                Ok(())
            }
        };
        self.tree.borrow_mut().remove(self.dom);
        removed
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

fn content_forward_ref(content_wrapper: Option<HostId>) -> ForwardRef {
    Rc::new(move |tree: &mut HostTree, node: HostId| {
        if let Some(content) = content_wrapper {
            if !tree.contains(node, content) {
                tree.append_child(node, content);
            }
        }
    })
}

fn attribute_updater(editor: &EditorHandle, get_pos: &PositionResolver) -> AttributeUpdater {
    let editor = editor.clone();
    let get_pos = get_pos.clone();
    Rc::new(move |attrs: Attrs, options: UpdateOptions| {
        update_attributes(&editor, &get_pos, attrs, options)
    })
}

/// Dispatch a markup change merging `attrs` onto the node at the resolver's
/// current position
pub fn update_attributes(
    editor: &EditorHandle,
    get_pos: &PositionResolver,
    attrs: Attrs,
    options: UpdateOptions,
) -> Result<(), EditorError> {
    let pos = get_pos().ok_or(EditorError::Detached)?;
    let state = editor.state().ok_or(EditorError::EditorGone)?;
    let current = state.doc.node_at(pos).ok_or(EditorError::NoNodeAt(pos))?;

    let mut merged = current.attrs().clone();
    merged.extend(attrs);

    editor.dispatch(
        Transaction::new()
            .set_node_markup(pos, merged)
            .add_to_history(options.add_to_history)
            .prevent_update(options.prevent_update)
            .force_update(options.force_update),
    )
}
