use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::PortalError;
use crate::host::{ForwardRef, HostId, HostTree};
use crate::portal::{Ambient, PortalHost};

/// Element description produced by components rendered through [`TreeHost`]
#[derive(Clone, Default)]
pub struct RenderNode {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    children: Vec<RenderNode>,
    text: Option<String>,
    forward_ref: Option<ForwardRef>,
}

impl RenderNode {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn text_child(self, text: &str) -> Self {
        self.child(RenderNode::text(text))
    }

    /// Report the mounted element to `forward_ref` once it exists
    pub fn with_ref(mut self, forward_ref: ForwardRef) -> Self {
        self.forward_ref = Some(forward_ref);
        self
    }
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return write!(f, "{text:?}");
        }
        f.debug_struct("RenderNode")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .field("forward_ref", &self.forward_ref.is_some())
            .finish()
    }
}

/// Elements one mount built, root first
#[derive(Debug)]
struct Mounted {
    root: HostId,
    built: HashSet<HostId>,
}

/// Portal host that materialises [`RenderNode`]s straight into the host tree.
///
/// Replaced and unmounted subtrees are freed. Elements the host did not build
/// (content handed in through a forward ref) go back to the mount point first.
#[derive(Debug, Default)]
pub struct TreeHost {
    mounted: HashMap<HostId, Mounted>,
    mounts: usize,
}

impl TreeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mounts, across all mount points
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    fn build(
        tree: &mut HostTree,
        node: RenderNode,
        refs: &mut Vec<(ForwardRef, HostId)>,
        built: &mut HashSet<HostId>,
    ) -> HostId {
        if let Some(text) = &node.text {
            let id = tree.create_text(text);
            built.insert(id);
            return id;
        }
        let id = tree.create_element(&node.tag);
        built.insert(id);
        for (name, value) in &node.attributes {
            tree.set_attribute(id, name, value);
        }
        for class in &node.classes {
            tree.add_class(id, class);
        }
        for child in node.children {
            let child_id = Self::build(tree, child, refs, built);
            tree.append_child(id, child_id);
        }
        if let Some(forward_ref) = node.forward_ref {
            refs.push((forward_ref, id));
        }
        id
    }

    fn clear(&mut self, tree: &mut HostTree, mount_point: HostId) {
        let Some(mounted) = self.mounted.remove(&mount_point) else {
            return;
        };
        let foreign: Vec<HostId> = mounted
            .built
            .iter()
            .flat_map(|id| tree.children(*id).to_vec())
            .filter(|child| !mounted.built.contains(child))
            .collect();
        for child in foreign {
            tree.append_child(mount_point, child);
        }
        let freed = tree.free(mounted.root);
        log::trace!("freed {freed} elements mounted at {mount_point:?}");
    }
}

impl PortalHost for TreeHost {
    type Element = RenderNode;

    fn mount(
        &mut self,
        tree: &mut HostTree,
        mount_point: HostId,
        element: RenderNode,
        ambient: &Ambient,
    ) -> Result<(), PortalError> {
        self.clear(tree, mount_point);

        let mut refs = Vec::new();
        let mut built = HashSet::new();
        let root = Self::build(tree, element, &mut refs, &mut built);
        tree.append_child(mount_point, root);
        tree.set_attribute(mount_point, "data-theme", &ambient.theme.name);
        for (forward_ref, id) in refs {
            forward_ref(tree, id);
        }

        self.mounted.insert(mount_point, Mounted { root, built });
        self.mounts += 1;
        Ok(())
    }

    fn unmount(&mut self, tree: &mut HostTree, mount_point: HostId) -> Result<(), PortalError> {
        self.clear(tree, mount_point);
        tree.remove_attribute(mount_point, "data-theme");
        if !tree.is_connected(mount_point) {
            return Err(PortalError::NotAttached(mount_point));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn figure() -> RenderNode {
        RenderNode::element("figure")
            .child(RenderNode::element("img").attr("src", "a.png"))
            .text_child("x")
    }

    #[test]
    fn test_rerender_reclaims_replaced_subtree() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        tree.append_child(tree.root(), mount);
        let mut host = TreeHost::new();
        host.mount(&mut tree, mount, figure(), &Ambient::default())
            .unwrap();
        let after_first = tree.element_count();

        for _ in 0..1000 {
            host.mount(&mut tree, mount, figure(), &Ambient::default())
                .unwrap();
        }

        assert_eq!(tree.element_count(), after_first);
        host.unmount(&mut tree, mount).unwrap();
        assert_eq!(tree.element_count(), 2);
    }

    #[test]
    fn test_rerender_hands_forwarded_content_to_new_subtree() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        let content = tree.create_element("div");
        tree.append_child(mount, content);
        let forward_ref: ForwardRef = Rc::new(move |tree: &mut HostTree, node: HostId| {
            tree.append_child(node, content);
        });
        let table = || {
            RenderNode::element("table")
                .child(RenderNode::element("tbody").with_ref(forward_ref.clone()))
        };
        let mut host = TreeHost::new();
        host.mount(&mut tree, mount, table(), &Ambient::default())
            .unwrap();
        let first_body = tree.parent(content).unwrap();

        host.mount(&mut tree, mount, table(), &Ambient::default())
            .unwrap();

        assert!(!tree.exists(first_body));
        let body = tree.parent(content).unwrap();
        assert_eq!(tree.tag(body), "tbody");
        assert!(tree.contains(mount, content));
        assert_eq!(tree.element_count(), 5);
    }

    #[test]
    fn test_unmount_returns_forwarded_content_to_mount_point() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        let content = tree.create_element("div");
        tree.append_child(tree.root(), mount);
        let forward_ref: ForwardRef = Rc::new(move |tree: &mut HostTree, node: HostId| {
            tree.append_child(node, content);
        });
        let mut host = TreeHost::new();
        host.mount(
            &mut tree,
            mount,
            RenderNode::element("section").with_ref(forward_ref),
            &Ambient::default(),
        )
        .unwrap();

        host.unmount(&mut tree, mount).unwrap();

        assert_eq!(tree.children(mount), &[content]);
        assert!(tree.exists(content));
    }

    #[test]
    fn test_mount_keeps_foreign_children() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        let content = tree.create_element("div");
        tree.append_child(mount, content);
        let mut host = TreeHost::new();

        host.mount(&mut tree, mount, RenderNode::element("p"), &Ambient::default())
            .unwrap();
        host.mount(&mut tree, mount, RenderNode::element("span"), &Ambient::default())
            .unwrap();

        let tags: Vec<&str> = tree.children(mount).iter().map(|id| tree.tag(*id)).collect();
        assert_eq!(tags, vec!["div", "span"]);
        assert_eq!(host.mount_count(), 2);
    }

    #[test]
    fn test_forward_ref_receives_mounted_element() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        let content = tree.create_element("div");
        tree.append_child(mount, content);
        let forward_ref: ForwardRef = Rc::new(move |tree: &mut HostTree, node: HostId| {
            tree.append_child(node, content);
        });
        let mut host = TreeHost::new();

        host.mount(
            &mut tree,
            mount,
            RenderNode::element("figure").child(RenderNode::element("td").with_ref(forward_ref)),
            &Ambient::default(),
        )
        .unwrap();

        let td = tree.parent(content).unwrap();
        assert_eq!(tree.tag(td), "td");
        assert!(tree.contains(mount, content));
    }

    #[test]
    fn test_unmount_detached_reports_not_attached() {
        let mut tree = HostTree::new();
        let mount = tree.create_element("div");
        let mut host = TreeHost::new();
        host.mount(&mut tree, mount, RenderNode::element("p"), &Ambient::default())
            .unwrap();

        let err = host.unmount(&mut tree, mount).unwrap_err();

        assert!(matches!(err, PortalError::NotAttached(id) if id == mount));
        assert!(tree.children(mount).is_empty());
    }
}
