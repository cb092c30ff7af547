use serde::Serialize;

use crate::model::{ContainerKind, DataObject, ObjectKind, ObjectRef};

use super::{Result, TreeError};

/// Index of a node inside a [`TreeModel`]. Ids are reused once a node has
/// been deleted, so they should not outlive the model they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

/// What a node displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeLabel {
    Root,
    Object {
        object: ObjectRef,
        name: String,
        pixels_id: Option<u64>,
    },
    /// Groups top-level datasets that no project claims.
    OrphanedDatasets,
}

impl NodeLabel {
    pub fn for_object(object: &DataObject) -> Self {
        let pixels_id = match object {
            DataObject::Image(image) => image.pixels.as_ref().map(|pixels| pixels.id),
            _ => None,
        };
        NodeLabel::Object {
            object: object.object_ref(),
            name: object.name().to_string(),
            pixels_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    label: NodeLabel,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
    children_loaded: bool,
    item_count: Option<usize>,
}

impl TreeNode {
    fn new(label: NodeLabel) -> Self {
        Self {
            label,
            parent: None,
            children: Vec::new(),
            expanded: false,
            children_loaded: false,
            item_count: None,
        }
    }

    pub fn label(&self) -> &NodeLabel {
        &self.label
    }

    pub fn object(&self) -> Option<ObjectRef> {
        match &self.label {
            NodeLabel::Object { object, .. } => Some(*object),
            _ => None,
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self.object()?.kind {
            ObjectKind::Container(kind) => Some(kind),
            ObjectKind::Image => None,
        }
    }

    pub fn name(&self) -> &str {
        match &self.label {
            NodeLabel::Root => "",
            NodeLabel::Object { name, .. } => name,
            NodeLabel::OrphanedDatasets => super::ORPHANED_DATASETS,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn children_loaded(&self) -> bool {
        self.children_loaded
    }

    /// Number of items the server reported, `None` when unknown.
    pub fn item_count(&self) -> Option<usize> {
        self.item_count
    }
}

/// Arena of display nodes under a single hidden root.
///
/// Nodes detached with [`TreeModel::remove_nodes_from_parent`] stay in the
/// arena and can be re-inserted; [`TreeModel::delete_node`] frees them.
#[derive(Debug, Clone)]
pub struct TreeModel {
    slots: Vec<Option<TreeNode>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for TreeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeModel {
    pub fn new() -> Self {
        let mut root = TreeNode::new(NodeLabel::Root);
        root.expanded = true;
        root.children_loaded = true;
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn top_level(&self) -> &[NodeId] {
        self.node(self.root)
            .map(TreeNode::children)
            .unwrap_or_default()
    }

    /// Number of live nodes, the root excluded.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get(&self, id: NodeId) -> Result<&TreeNode> {
        self.node(id).ok_or(TreeError::UnknownNode(id))
    }

    pub(super) fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Allocates a detached node.
    pub fn alloc(&mut self, label: NodeLabel) -> NodeId {
        let node = TreeNode::new(label);
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Detached copy of `source` without its children.
    pub(super) fn alloc_copy(&mut self, source: NodeId) -> Result<NodeId> {
        let original = self.get(source)?;
        let mut copy = TreeNode::new(original.label.clone());
        copy.expanded = original.expanded;
        copy.children_loaded = original.children_loaded;
        copy.item_count = original.item_count;
        let id = self.alloc(NodeLabel::Root);
        *self.get_mut(id)? = copy;
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.get(parent)?.children.len();
        self.insert_child(parent, child, index)
    }

    /// Moves `child` under `parent` at `index`, detaching it from its current
    /// parent first. `index` is clamped to the child count after detaching.
    pub(super) fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        if child == self.root {
            return Err(TreeError::RootNode);
        }
        self.get(parent)?;
        self.get(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle {
                node: child,
                parent,
            });
        }
        self.detach(child)?;
        let siblings = &mut self.get_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlinks `id` from its parent. The subtree stays in the arena.
    pub(super) fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(());
        };
        self.get_mut(parent)?.children.retain(|child| *child != id);
        self.get_mut(id)?.parent = None;
        Ok(())
    }

    /// Detaches `id` and frees it together with all its descendants.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(TreeError::RootNode);
        }
        self.detach(id)?;
        for node in self.descendants(id)? {
            self.slots[node.0] = None;
            self.free.push(node.0);
        }
        Ok(())
    }

    /// Removes every node except the root.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn index_in_parent(&self, id: NodeId) -> Result<Option<usize>> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(None);
        };
        Ok(self.get(parent)?.children.iter().position(|child| *child == id))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(None);
        };
        let siblings = &self.get(parent)?.children;
        let index = siblings.iter().position(|child| *child == id);
        Ok(index
            .and_then(|index| index.checked_sub(1))
            .map(|index| siblings[index]))
    }

    /// `ancestor` is `node` itself or one of its parents.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(TreeNode::parent);
        }
        false
    }

    /// `id` and its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.get(id)?;
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            found.push(current);
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().rev());
            }
        }
        Ok(found)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<()> {
        self.get_mut(id)?.expanded = expanded;
        Ok(())
    }

    pub fn set_item_count(&mut self, id: NodeId, item_count: Option<usize>) -> Result<()> {
        self.get_mut(id)?.item_count = item_count;
        Ok(())
    }

    pub(super) fn set_loaded(&mut self, id: NodeId, item_count: Option<usize>) -> Result<()> {
        let node = self.get_mut(id)?;
        node.children_loaded = true;
        node.item_count = item_count;
        Ok(())
    }

    /// Nodes a tree view would currently show, paired with their depth.
    /// Children of collapsed nodes are skipped.
    pub fn visible_nodes(&self) -> Vec<(NodeId, usize)> {
        let mut visible = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .top_level()
            .iter()
            .rev()
            .map(|id| (*id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            visible.push((id, depth));
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        visible
    }
}
