//! Portal host mounting Dioxus components into host elements.
//!
//! Each mount runs the component in its own [`VirtualDom`] and stores the
//! server-rendered markup on the mount point. The ambient theme is provided
//! as context, so components read it with `use_context::<Theme>()` exactly
//! as they would under the application root.

use std::collections::HashMap;
use std::rc::Rc;

use dioxus::dioxus_core::VirtualDom;
use dioxus::prelude::*;
use nodeview_core::host::{HostId, HostTree};
use nodeview_core::portal::{Ambient, PortalHost, Theme};
use nodeview_core::view::{Component, NodeViewProps};
use nodeview_core::PortalError;

/// Deferred render of one component, run inside the mount's runtime
#[derive(Clone)]
pub struct RenderSlot(Rc<dyn Fn() -> Element>);

impl RenderSlot {
    pub fn new(render: impl Fn() -> Element + 'static) -> Self {
        Self(Rc::new(render))
    }
}

impl PartialEq for RenderSlot {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[component]
fn PortalRoot(theme: Theme, slot: RenderSlot) -> Element {
    use_context_provider(|| theme.clone());
    (slot.0)()
}

/// Adapt a Dioxus render function into a node-view component
pub fn dioxus_component(
    render: impl Fn(NodeViewProps) -> Element + 'static,
) -> Component<RenderSlot> {
    let render = Rc::new(render);
    Rc::new(move |props: &NodeViewProps| {
        let render = render.clone();
        let props = props.clone();
        RenderSlot::new(move || render(props.clone()))
    })
}

#[derive(Debug, Default)]
pub struct DioxusHost {
    rendered: HashMap<HostId, String>,
    mounts: usize,
}

impl DioxusHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup last mounted at `mount_point`
    pub fn html(&self, mount_point: HostId) -> Option<&str> {
        self.rendered.get(&mount_point).map(String::as_str)
    }

    pub fn mount_count(&self) -> usize {
        self.mounts
    }
}

impl PortalHost for DioxusHost {
    type Element = RenderSlot;

    fn mount(
        &mut self,
        tree: &mut HostTree,
        mount_point: HostId,
        element: RenderSlot,
        ambient: &Ambient,
    ) -> Result<(), PortalError> {
        if tree.text(mount_point).is_some() {
            return Err(PortalError::Mount {
                mount_point,
                reason: "text nodes cannot host components".to_string(),
            });
        }

        let mut dom = VirtualDom::new_with_props(
            PortalRoot,
            PortalRootProps {
                theme: ambient.theme.clone(),
                slot: element,
            },
        );
        dom.rebuild_in_place();
        let html = dioxus_ssr::render(&dom);
        log::debug!("mounted {} bytes of markup at {mount_point:?}", html.len());

        tree.set_markup(mount_point, Some(html.clone()));
        tree.set_attribute(mount_point, "data-theme", &ambient.theme.name);
        self.rendered.insert(mount_point, html);
        self.mounts += 1;
        Ok(())
    }

    fn unmount(&mut self, tree: &mut HostTree, mount_point: HostId) -> Result<(), PortalError> {
        self.rendered.remove(&mount_point);
        tree.set_markup(mount_point, None);
        tree.remove_attribute(mount_point, "data-theme");
        if !tree.is_connected(mount_point) {
            return Err(PortalError::NotAttached(mount_point));
        }
        Ok(())
    }
}
