//! Hierarchical resource tree
//!
//! Arena-backed: nodes live in a flat `Vec` and refer to each other by
//! index, so parent back-references need no `Rc`/`Weak` machinery. The
//! renderer consumes a flattened list of visible node ids, recomputed on
//! every structural change.
//!
//! Children are lazy: a node's `children` stays empty until its first
//! expansion completes. Replacing children (refresh) orphans the old
//! subtree in the arena; entries are session-scoped and never freed.

use crate::cloud::Resource;

pub type NodeId = usize;

/// Level in the Tenant -> Subscription -> Group -> Resource hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Tenant,
    Subscription,
    Group,
    Resource,
}

impl NodeKind {
    /// Resources are leaves; everything above can hold children
    pub fn expandable(&self) -> bool {
        !matches!(self, Self::Resource)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Tenant => "⌂",
            Self::Subscription => "☁",
            Self::Group => "▣",
            Self::Resource => "·",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub label: String,
    /// Cloud-side identity: tenant id, subscription id, group name, or
    /// resource id. Selection survives rebuilds through this.
    pub azure_id: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    /// Child listing in flight; render a spinner
    pub loading: bool,
    /// Children have been attached at least once
    pub loaded: bool,
    pub resource: Option<Resource>,
}

/// Specification of one child to attach
#[derive(Debug, Clone)]
pub struct ChildSpec {
    pub kind: NodeKind,
    pub label: String,
    pub azure_id: String,
    pub resource: Option<Resource>,
}

/// The tree plus its flattened view and selection
#[derive(Debug, Default)]
pub struct ResourceTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    visible: Vec<NodeId>,
    /// Index into `visible`; clamped to `[0, max(0, len-1)]`
    selected: usize,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.visible.clear();
        self.selected = 0;
    }

    pub fn add_root(&mut self, kind: NodeKind, label: impl Into<String>, azure_id: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            kind,
            label: label.into(),
            azure_id: azure_id.into(),
            parent: None,
            children: Vec::new(),
            depth: 0,
            expandable: kind.expandable(),
            expanded: false,
            loading: false,
            loaded: false,
            resource: None,
        });
        self.roots.push(id);
        self.rebuild_visible();
        id
    }

    /// Attach children to a node, replacing any previous set. Children
    /// are attached in stable name order. Marks the node loaded and
    /// expanded; the caller already holds the expansion gesture.
    pub fn set_children(&mut self, parent: NodeId, mut specs: Vec<ChildSpec>) {
        if parent >= self.nodes.len() {
            return;
        }
        specs.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));

        let depth = self.nodes[parent].depth + 1;
        let mut child_ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = self.nodes.len();
            self.nodes.push(TreeNode {
                expandable: spec.kind.expandable(),
                kind: spec.kind,
                label: spec.label,
                azure_id: spec.azure_id,
                parent: Some(parent),
                children: Vec::new(),
                depth,
                expanded: false,
                loading: false,
                loaded: false,
                resource: spec.resource,
            });
            child_ids.push(id);
        }

        let node = &mut self.nodes[parent];
        node.children = child_ids;
        node.loaded = true;
        node.loading = false;
        node.expanded = true;
        self.rebuild_visible();
    }

    /// Mark a node as waiting for its child listing
    pub fn begin_loading(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.loading = true;
            node.expanded = true;
            self.rebuild_visible();
        }
    }

    /// Child listing failed: revert the expansion
    pub fn abort_loading(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.loading = false;
            node.expanded = false;
            self.rebuild_visible();
        }
    }

    pub fn expand(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id)
            && node.expandable
            && !node.expanded
        {
            node.expanded = true;
            self.rebuild_visible();
        }
    }

    pub fn collapse(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id)
            && node.expanded
        {
            node.expanded = false;
            self.rebuild_visible();
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// All live resources reachable from the roots, for search indexing
    pub fn resources(&self) -> Vec<&Resource> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                if let Some(resource) = &node.resource {
                    out.push(resource);
                }
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// Find the node holding a given cloud-side id
    pub fn find(&self, azure_id: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id)?;
            if node.azure_id == azure_id {
                return Some(id);
            }
            stack.extend(node.children.iter().copied());
        }
        None
    }

    /// Expand every ancestor of a node so it becomes visible, then select it
    pub fn reveal(&mut self, id: NodeId) {
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(pid) = current {
            self.nodes[pid].expanded = true;
            current = self.nodes[pid].parent;
        }
        self.rebuild_visible();
        if let Some(pos) = self.visible.iter().position(|&v| v == id) {
            self.selected = pos;
        }
    }

    // === Flattened view ===

    fn rebuild_visible(&mut self) {
        let previously_selected = self.selected_node().map(|n| n.azure_id.clone());

        self.visible.clear();
        let roots = self.roots.clone();
        for root in roots {
            self.push_visible(root);
        }

        // Preserve selection by identity, fall back to nearest index
        if let Some(prev) = previously_selected
            && let Some(pos) = self
                .visible
                .iter()
                .position(|&id| self.nodes[id].azure_id == prev)
        {
            self.selected = pos;
        }
        self.clamp_selection();
    }

    fn push_visible(&mut self, id: NodeId) {
        self.visible.push(id);
        if self.nodes[id].expanded {
            let children = self.nodes[id].children.clone();
            for child in children {
                self.push_visible(child);
            }
        }
    }

    pub fn visible(&self) -> &[NodeId] {
        &self.visible
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Selection ===

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.visible.get(self.selected).copied()
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.selected_id().and_then(|id| self.nodes.get(id))
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let max = self.visible.len().saturating_sub(1);
        if self.selected > max {
            self.selected = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(kind: NodeKind, label: &str) -> ChildSpec {
        ChildSpec {
            kind,
            label: label.to_string(),
            azure_id: label.to_string(),
            resource: None,
        }
    }

    fn sample_tree() -> ResourceTree {
        let mut tree = ResourceTree::new();
        let tenant = tree.add_root(NodeKind::Tenant, "contoso", "tenant-1");
        tree.set_children(
            tenant,
            vec![child(NodeKind::Subscription, "prod"), child(NodeKind::Subscription, "dev")],
        );
        tree
    }

    #[test]
    fn test_children_sorted_by_name() {
        let tree = sample_tree();
        let labels: Vec<&str> = tree.visible().iter().map(|&id| tree.get(id).unwrap().label.as_str()).collect();
        assert_eq!(labels, vec!["contoso", "dev", "prod"]);
    }

    #[test]
    fn test_expand_collapse_round_trip() {
        let mut tree = sample_tree();
        let dev = tree.find("dev").unwrap();
        tree.set_children(dev, vec![child(NodeKind::Group, "rg-a")]);
        let expanded_view: Vec<NodeId> = tree.visible().to_vec();
        assert_eq!(expanded_view.len(), 4);

        tree.collapse(dev);
        assert_eq!(tree.visible_len(), 3);

        tree.expand(dev);
        assert_eq!(tree.visible(), expanded_view.as_slice());
    }

    #[test]
    fn test_collapse_restores_pre_expansion_view() {
        let mut tree = sample_tree();
        let before: Vec<NodeId> = tree.visible().to_vec();
        let dev = tree.find("dev").unwrap();
        tree.set_children(dev, vec![child(NodeKind::Group, "rg-a"), child(NodeKind::Group, "rg-b")]);
        tree.collapse(dev);
        assert_eq!(tree.visible(), before.as_slice());
    }

    #[test]
    fn test_selection_preserved_by_identity() {
        let mut tree = sample_tree();
        tree.select_next();
        tree.select_next();
        assert_eq!(tree.selected_node().unwrap().label, "prod");

        // Expanding a sibling above shifts indices but not identity
        let dev = tree.find("dev").unwrap();
        tree.set_children(dev, vec![child(NodeKind::Group, "rg-a")]);
        assert_eq!(tree.selected_node().unwrap().label, "prod");
    }

    #[test]
    fn test_selection_clamped_when_view_shrinks() {
        let mut tree = sample_tree();
        let dev = tree.find("dev").unwrap();
        tree.set_children(dev, vec![child(NodeKind::Group, "rg-a"), child(NodeKind::Group, "rg-b")]);
        tree.select_last();
        tree.collapse(dev);
        assert!(tree.selected_index() < tree.visible_len());
    }

    #[test]
    fn test_failed_load_reverts_expansion() {
        let mut tree = sample_tree();
        let dev = tree.find("dev").unwrap();
        tree.begin_loading(dev);
        assert!(tree.get(dev).unwrap().loading);
        assert!(tree.get(dev).unwrap().expanded);

        tree.abort_loading(dev);
        let node = tree.get(dev).unwrap();
        assert!(!node.loading);
        assert!(!node.expanded);
        assert!(!node.loaded);
    }

    #[test]
    fn test_lazy_loading_children_empty_until_set() {
        let tree = sample_tree();
        let dev = tree.find("dev").unwrap();
        assert!(tree.get(dev).unwrap().children.is_empty());
        assert!(!tree.get(dev).unwrap().loaded);
    }

    #[test]
    fn test_reveal_expands_ancestors() {
        let mut tree = sample_tree();
        let dev = tree.find("dev").unwrap();
        tree.set_children(dev, vec![child(NodeKind::Group, "rg-a")]);
        tree.collapse(dev);
        let rg = tree.find("rg-a").unwrap();

        tree.reveal(rg);
        assert_eq!(tree.selected_node().unwrap().label, "rg-a");
    }

    #[test]
    fn test_selection_bounds_on_empty_tree() {
        let mut tree = ResourceTree::new();
        tree.select_next();
        tree.select_last();
        assert_eq!(tree.selected_index(), 0);
        assert!(tree.selected_node().is_none());
    }
}
