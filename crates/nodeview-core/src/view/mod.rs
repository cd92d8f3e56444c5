//! Node views: document nodes rendered by hosted components.
//!
//! A [`NodeView`] composes shared behaviour (mount point ownership, event and
//! mutation filtering, drag start, attribute commands) with a strategy that
//! decides when a change needs a re-render. [`create_node_view`] builds
//! factories for plain views, [`create_selection_based_node_view`] for views
//! that also follow the selection.

pub mod drag;
pub mod filter;
pub mod node_view;
pub mod props;
pub mod registry;
pub mod selection;

pub use drag::{DRAG_HANDLE_ATTR, DRAG_IMAGE_ATTR, Dragging};
pub use node_view::{NodeView, ShouldUpdate, update_attributes};
pub use props::{AttributeUpdater, Component, NodeViewProps, PositionResolver, UpdateOptions};
pub use registry::{NodeViewFactory, NodeViewRegistry};

use std::cell::RefCell;
use std::rc::Rc;

use crate::dispatcher::Listener;
use crate::editor::EditorHandle;
use crate::error::PortalError;
use crate::host::{HostEvent, HostId, HostMutation, HostTree};
use crate::model::{Node, Patch, Selection};
use crate::portal::{PortalHandle, PortalHost};
use node_view::BaseStrategy;
use selection::SelectionStrategy;

/// Inline styling hint passed along with an update; views may ignore it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub class: String,
}

/// Capability interface the editor drives every node view through
pub trait NodeViewBehavior {
    fn dom(&self) -> HostId;

    fn content_dom(&self) -> Option<HostId>;

    fn node(&self) -> &Node;

    /// Take `node` as the new version of this view's node.
    ///
    /// Returns false when the view cannot represent `node`; the caller must
    /// then destroy it and create a fresh one.
    fn update(&mut self, node: Node, decorations: &[Decoration], inner: &[Decoration]) -> bool;

    fn select_node(&mut self);

    fn deselect_node(&mut self);

    fn is_selected(&self) -> bool;

    /// Whether the view handles `event` instead of the document engine
    fn stop_event(&mut self, event: &mut HostEvent) -> bool;

    /// Whether the document engine should disregard an observed mutation
    fn ignore_mutation(&self, mutation: &HostMutation) -> bool;

    /// Start dragging the whole node; false when the event is not a drag
    /// from this view's handle
    fn on_drag_start(&mut self, event: &mut HostEvent) -> bool;

    fn end_drag(&mut self);

    fn is_dragging(&self) -> bool;

    fn force_render(&mut self);

    /// Release the mount point. Safe to call more than once.
    fn destroy(&mut self) -> Result<(), PortalError>;

    fn is_destroyed(&self) -> bool;
}

/// Elements built by a custom content factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentParts {
    /// Appended under the mount point
    pub dom: HostId,
    /// Where the engine edits content; `dom` itself when absent
    pub content_dom: Option<HostId>,
}

pub type ContentFactory = Rc<dyn Fn(&mut HostTree, &Node) -> Option<ContentParts>>;

pub type WrapperFactory = Rc<dyn Fn(&mut HostTree, &Node) -> HostId>;

/// How a view's mixed-ownership content element is created
#[derive(Clone, Default)]
pub enum ContentDom {
    /// Fully opaque view
    #[default]
    None,
    /// `div.<type>-content-wrapper`
    Default,
    Custom(ContentFactory),
}

pub struct NodeViewOptions<H: PortalHost> {
    pub component: Component<H::Element>,
    pub portal: PortalHandle<H>,
    pub should_update: Option<ShouldUpdate>,
    pub content_dom: ContentDom,
    pub wrapper: Option<WrapperFactory>,
}

impl<H: PortalHost> NodeViewOptions<H> {
    pub fn new(component: Component<H::Element>, portal: PortalHandle<H>) -> Self {
        Self {
            component,
            portal,
            should_update: None,
            content_dom: ContentDom::None,
            wrapper: None,
        }
    }

    pub fn should_update(mut self, should_update: ShouldUpdate) -> Self {
        self.should_update = Some(should_update);
        self
    }

    pub fn content_dom(mut self, content_dom: ContentDom) -> Self {
        self.content_dom = content_dom;
        self
    }

    pub fn wrapper(mut self, wrapper: WrapperFactory) -> Self {
        self.wrapper = Some(wrapper);
        self
    }
}

impl<H: PortalHost> Clone for NodeViewOptions<H> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            portal: self.portal.clone(),
            should_update: self.should_update.clone(),
            content_dom: self.content_dom.clone(),
            wrapper: self.wrapper.clone(),
        }
    }
}

/// Factory for views that re-render on every node change unless
/// `should_update` says otherwise
pub fn create_node_view<H: PortalHost + 'static>(options: NodeViewOptions<H>) -> NodeViewFactory {
    Rc::new(move |node: Node, get_pos: PositionResolver, editor: EditorHandle| {
        let view = NodeView::init(node, get_pos, editor, &options, Box::new(BaseStrategy));
        Rc::new(RefCell::new(view)) as Rc<RefCell<dyn NodeViewBehavior>>
    })
}

/// Factory for views that also re-render when the selection moves into, out
/// of or across their node
pub fn create_selection_based_node_view<H: PortalHost + 'static>(
    options: NodeViewOptions<H>,
) -> NodeViewFactory {
    Rc::new(move |node: Node, get_pos: PositionResolver, editor: EditorHandle| {
        let initial = editor
            .selection()
            .unwrap_or_else(|| Selection::cursor(0));
        let channel = editor.selection_channel();
        let view = Rc::new(RefCell::new(NodeView::init(
            node,
            get_pos,
            editor,
            &options,
            Box::new(SelectionStrategy::new(initial)),
        )));

        let weak = Rc::downgrade(&view);
        let listener: Listener<Patch> = Rc::new(move |_patch: &Patch| {
            let Some(view) = weak.upgrade() else {
                return Ok(());
            };
            match view.try_borrow_mut() {
                Ok(mut view) => view.refresh(),
                Err(_) => log::warn!("node view busy, skipping selection refresh"),
            }
            Ok(())
        });
        view.borrow_mut().subscribe(channel, listener);

        view as Rc<RefCell<dyn NodeViewBehavior>>
    })
}
