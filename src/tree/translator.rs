use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::model::{ContainerKind, DataObject};

use super::{NodeId, NodeLabel, Result, TreeError, TreeModel};

/// Label of the group collecting top-level datasets.
pub const ORPHANED_DATASETS: &str = "Orphaned Datasets";

/// Ids of expanded top-level containers, per kind.
pub type ExpandedNodes = BTreeMap<ContainerKind, BTreeSet<u64>>;

impl TreeModel {
    /// Builds the display tree for a freshly loaded hierarchy. Objects the user
    /// cannot read are left out at every level.
    pub fn transform_hierarchy(
        objects: &[DataObject],
        user_id: u64,
        group_id: u64,
    ) -> Result<Self> {
        let mut tree = Self::new();
        tree.populate(objects, user_id, group_id, &ExpandedNodes::new())?;
        Ok(tree)
    }

    /// Rebuilds the tree from reloaded data. Top-level containers that were
    /// expanded before stay expanded.
    pub fn refresh_hierarchy(
        &mut self,
        objects: &[DataObject],
        user_id: u64,
        group_id: u64,
    ) -> Result<()> {
        let expanded = self.expanded_top_nodes();
        self.clear();
        self.populate(objects, user_id, group_id, &expanded)
    }

    /// Expanded containers at the top of the tree or inside the orphaned
    /// datasets group.
    pub fn expanded_top_nodes(&self) -> ExpandedNodes {
        let mut expanded = ExpandedNodes::new();
        let mut record = |id: NodeId| {
            if let Some(node) = self.node(id)
                && node.is_expanded()
                && let (Some(kind), Some(object)) = (node.container_kind(), node.object())
            {
                expanded.entry(kind).or_default().insert(object.id);
            }
        };
        for id in self.top_level() {
            match self.node(*id).map(|node| node.label()) {
                Some(NodeLabel::OrphanedDatasets) => {
                    if let Some(group) = self.node(*id) {
                        group.children().iter().copied().for_each(&mut record);
                    }
                }
                _ => record(*id),
            }
        }
        expanded
    }

    /// Converts a single object into a detached subtree.
    pub fn transform_object(
        &mut self,
        object: &DataObject,
        user_id: u64,
        group_id: u64,
    ) -> Result<NodeId> {
        if !object.is_readable_by(user_id, group_id) {
            return Err(TreeError::NotReadable(object.object_ref()));
        }
        self.build(object, user_id, group_id)
    }

    /// Swaps the children of `node` for the freshly loaded ones of `object`.
    /// The node keeps its place and expanded state.
    pub fn replace_children(
        &mut self,
        node: NodeId,
        object: &DataObject,
        user_id: u64,
        group_id: u64,
    ) -> Result<()> {
        let previous = self.get(node)?.children().to_vec();
        for child in previous {
            self.delete_node(child)?;
        }
        let Some(children) = object.children() else {
            return Ok(());
        };
        let shown = self.append_readable(node, children, user_id, group_id)?;
        self.set_loaded(node, Some(shown))
    }

    fn populate(
        &mut self,
        objects: &[DataObject],
        user_id: u64,
        group_id: u64,
        expanded: &ExpandedNodes,
    ) -> Result<()> {
        let root = self.root();
        let mut orphans = None;
        for object in objects {
            if !object.is_readable_by(user_id, group_id) {
                debug!(object = ?object.object_ref(), "skipping unreadable object");
                continue;
            }
            let parent = match (object, orphans) {
                (DataObject::Dataset(_), Some(group)) => group,
                (DataObject::Dataset(_), None) => {
                    let group = self.alloc(NodeLabel::OrphanedDatasets);
                    self.set_loaded(group, None)?;
                    self.append_child(root, group)?;
                    orphans = Some(group);
                    group
                }
                _ => root,
            };
            let id = self.build(object, user_id, group_id)?;
            self.append_child(parent, id)?;
            let keep_open = object
                .container_kind()
                .and_then(|kind| expanded.get(&kind))
                .is_some_and(|ids| ids.contains(&object.id()));
            self.set_expanded(id, keep_open)?;
        }
        Ok(())
    }

    fn build(&mut self, object: &DataObject, user_id: u64, group_id: u64) -> Result<NodeId> {
        let id = self.alloc(NodeLabel::for_object(object));
        let Some(children) = object.children() else {
            return Ok(id);
        };
        let shown = self.append_readable(id, children, user_id, group_id)?;
        let item_count = match object {
            DataObject::Tag(_) if shown == 0 => None,
            _ => Some(shown),
        };
        self.set_loaded(id, item_count)?;
        Ok(id)
    }

    /// Builds and appends the readable `children`, returning how many were
    /// shown.
    fn append_readable(
        &mut self,
        parent: NodeId,
        children: &[DataObject],
        user_id: u64,
        group_id: u64,
    ) -> Result<usize> {
        let mut shown = 0;
        for child in children {
            if child.is_readable_by(user_id, group_id) {
                let child_id = self.build(child, user_id, group_id)?;
                self.append_child(parent, child_id)?;
                shown += 1;
            }
        }
        Ok(shown)
    }
}
