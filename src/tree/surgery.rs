use std::collections::HashMap;

use super::{NodeId, Result, TreeError, TreeModel};

impl TreeModel {
    /// Inserts `nodes` under `parent` from `index` on, keeping their order.
    /// An index past the end appends.
    pub fn insert_nodes_into(&mut self, nodes: &[NodeId], parent: NodeId, index: usize) -> Result<()> {
        let mut index = index.min(self.get(parent)?.children().len());
        for node in nodes {
            self.insert_child(parent, *node, index)?;
            index = self.index_in_parent(*node)?.map_or(index, |position| position + 1);
        }
        Ok(())
    }

    /// Unlinks each node from its parent. Detached subtrees can be inserted
    /// again or freed with [`TreeModel::delete_node`].
    pub fn remove_nodes_from_parent(&mut self, nodes: &[NodeId]) -> Result<()> {
        for node in nodes {
            if *node == self.root() {
                return Err(TreeError::RootNode);
            }
            self.detach(*node)?;
        }
        Ok(())
    }

    /// Deep copy of the subtree at `source`, returned detached.
    pub fn duplicate_node(&mut self, source: NodeId) -> Result<NodeId> {
        if source == self.root() {
            return Err(TreeError::RootNode);
        }
        let originals = self.descendants(source)?;
        let mut copies = HashMap::with_capacity(originals.len());
        for original in originals {
            let copy = self.alloc_copy(original)?;
            if original != source {
                let parent = self.get(original)?.parent().and_then(|parent| copies.get(&parent));
                if let Some(parent) = parent.copied() {
                    self.append_child(parent, copy)?;
                }
            }
            copies.insert(original, copy);
        }
        copies.get(&source).copied().ok_or(TreeError::UnknownNode(source))
    }

    /// Moves the nodes under the sibling just before the first of them.
    /// Returns `false` when there is no such sibling.
    pub fn indent_nodes_right(&mut self, nodes: &[NodeId]) -> Result<bool> {
        let Some(first) = nodes.first() else {
            return Ok(false);
        };
        self.check_siblings(nodes)?;
        let Some(target) = self.previous_sibling(*first)? else {
            return Ok(false);
        };
        for node in nodes {
            self.append_child(target, *node)?;
        }
        Ok(true)
    }

    /// Moves the nodes up one level, right after their current parent.
    /// Siblings following the last node become its children so the visual
    /// order of the tree is kept. Returns `false` at the top level.
    pub fn indent_nodes_left(&mut self, nodes: &[NodeId]) -> Result<bool> {
        let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
            return Ok(false);
        };
        self.check_siblings(nodes)?;
        let Some(parent) = self.get(*first)?.parent() else {
            return Ok(false);
        };
        let Some(grandparent) = self.get(parent)?.parent() else {
            return Ok(false);
        };

        let position = self.index_in_parent(*last)?.unwrap_or_default();
        let trailing = self.get(parent)?.children()[position + 1..].to_vec();
        for sibling in trailing {
            self.append_child(*last, sibling)?;
        }

        let mut index = self.index_in_parent(parent)?.map_or(0, |position| position + 1);
        for node in nodes {
            self.insert_child(grandparent, *node, index)?;
            index += 1;
        }
        Ok(true)
    }

    /// Moves one node up a level, right after its parent. Its following
    /// siblings stay where they are.
    pub fn indent_node_left(&mut self, node: NodeId) -> Result<bool> {
        let Some(parent) = self.get(node)?.parent() else {
            return Ok(false);
        };
        let Some(grandparent) = self.get(parent)?.parent() else {
            return Ok(false);
        };
        let index = self.index_in_parent(parent)?.map_or(0, |position| position + 1);
        self.insert_child(grandparent, node, index)?;
        Ok(true)
    }

    fn check_siblings(&self, nodes: &[NodeId]) -> Result<()> {
        let mut parents = nodes.iter().map(|node| self.get(*node).map(|node| node.parent()));
        let Some(first) = parents.next().transpose()? else {
            return Ok(());
        };
        for parent in parents {
            if parent? != first {
                return Err(TreeError::MixedParents);
            }
        }
        Ok(())
    }
}
