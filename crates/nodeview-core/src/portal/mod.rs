//! Portal Registry: one render function per mount point.
//!
//! Node views never mount UI themselves. They hand the registry a render
//! function and the mount point they own; the registry remembers the function
//! (so the subtree can be re-rendered when ambient context changes) and asks a
//! [`PortalHost`] to mount its output imperatively.

pub mod tree_host;

pub use tree_host::{RenderNode, TreeHost};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use nodeview_config::Config;

use crate::error::PortalError;
use crate::host::{HostHandle, HostId, HostTree};

/// Lazily invoked render function for one mount point
pub type RenderFn<E> = Rc<dyn Fn() -> E>;

pub type PortalHandle<H> = Rc<RefCell<PortalRegistry<H>>>;

/// Visual theme handed to every hosted subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub space: Option<Vec<u32>>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "light".to_string(),
            space: None,
        }
    }
}

impl From<&Config> for Theme {
    fn from(config: &Config) -> Self {
        Self {
            name: config.theme.name.clone(),
            space: config.theme_space(),
        }
    }
}

/// Context that does not flow through an imperative mount on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    pub theme: Theme,
}

/// UI framework binding that can mount rendered output into a host element
pub trait PortalHost {
    type Element: 'static;

    /// Mount `element` into `mount_point`, replacing whatever this host
    /// mounted there before
    fn mount(
        &mut self,
        tree: &mut HostTree,
        mount_point: HostId,
        element: Self::Element,
        ambient: &Ambient,
    ) -> Result<(), PortalError>;

    /// Tear down what was mounted at `mount_point`. Reports
    /// [`PortalError::NotAttached`] after cleaning up when the mount point has
    /// already left the tree.
    fn unmount(&mut self, tree: &mut HostTree, mount_point: HostId) -> Result<(), PortalError>;
}

/// Mount points whose views were torn down while the registry was borrowed.
///
/// Clones share one queue; the registry releases everything queued before its
/// next render, removal or forced update.
#[derive(Debug, Clone, Default)]
pub struct DeferredRemovals(Rc<RefCell<Vec<HostId>>>);

impl DeferredRemovals {
    pub fn defer(&self, mount_point: HostId) {
        self.0.borrow_mut().push(mount_point);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn take(&self) -> Vec<HostId> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

pub struct PortalRegistry<H: PortalHost> {
    host: H,
    tree: HostHandle,
    ambient: Ambient,
    entries: BTreeMap<HostId, RenderFn<H::Element>>,
    deferred: DeferredRemovals,
}

impl<H: PortalHost> PortalRegistry<H> {
    pub fn new(host: H, tree: HostHandle) -> Self {
        Self {
            host,
            tree,
            ambient: Ambient::default(),
            entries: BTreeMap::new(),
            deferred: DeferredRemovals::default(),
        }
    }

    pub fn shared(host: H, tree: HostHandle) -> PortalHandle<H> {
        Rc::new(RefCell::new(Self::new(host, tree)))
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn tree(&self) -> &HostHandle {
        &self.tree
    }

    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    /// Queue shared with views, for removals requested while this registry
    /// is borrowed
    pub fn deferred_removals(&self) -> DeferredRemovals {
        self.deferred.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_registered(&self, mount_point: HostId) -> bool {
        self.entries.contains_key(&mount_point)
    }

    /// Store `render_fn` for `mount_point`, replacing any previous entry, and
    /// mount its output
    pub fn render(
        &mut self,
        render_fn: RenderFn<H::Element>,
        mount_point: HostId,
    ) -> Result<(), PortalError> {
        self.release_deferred();
        if !self.tree.borrow().exists(mount_point) {
            log::warn!("no mount point {mount_point:?}, skipping portal render");
            return Ok(());
        }
        self.entries.insert(mount_point, render_fn.clone());
        self.apply(&render_fn, mount_point)
    }

    fn apply(
        &mut self,
        render_fn: &RenderFn<H::Element>,
        mount_point: HostId,
    ) -> Result<(), PortalError> {
        let element = render_fn();
        let mut tree = self.tree.borrow_mut();
        self.host
            .mount(&mut tree, mount_point, element, &self.ambient)
    }

    /// Unmount and forget `mount_point`.
    ///
    /// A mount point that already left the tree is not an error here.
    pub fn remove(&mut self, mount_point: HostId) -> Result<(), PortalError> {
        self.release_deferred();
        self.release(mount_point)
    }

    fn release(&mut self, mount_point: HostId) -> Result<(), PortalError> {
        if self.entries.remove(&mount_point).is_none() {
            return Ok(());
        }
        let mut tree = self.tree.borrow_mut();
        match self.host.unmount(&mut tree, mount_point) {
            Err(PortalError::NotAttached(_)) => {
                log::debug!("mount point {mount_point:?} already detached");
                Ok(())
            }
            result => result,
        }
    }

    /// Re-render every entry in place, returning the first failure after
    /// attempting all of them
    pub fn force_update(&mut self) -> Result<(), PortalError> {
        self.release_deferred();
        let entries: Vec<(HostId, RenderFn<H::Element>)> = self
            .entries
            .iter()
            .map(|(mount_point, render_fn)| (*mount_point, render_fn.clone()))
            .collect();
        let mut first_error = None;
        for (mount_point, render_fn) in entries {
            if let Err(err) = self.apply(&render_fn, mount_point) {
                log::error!("failed to re-render portal at {mount_point:?}: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn release_deferred(&mut self) {
        for mount_point in self.deferred.take() {
            if let Err(err) = self.release(mount_point) {
                log::error!("failed to release deferred portal at {mount_point:?}: {err}");
            }
        }
    }

    /// Replace the ambient context and push it into every mounted subtree
    pub fn set_ambient(&mut self, ambient: Ambient) -> Result<(), PortalError> {
        if self.ambient == ambient {
            return Ok(());
        }
        self.ambient = ambient;
        self.force_update()
    }
}
