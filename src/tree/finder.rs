use crate::model::ObjectRef;

use super::{NodeId, NodeLabel, TreeModel, TreeNode};

impl TreeModel {
    /// Pre-order walk over every node below the root, detached nodes excluded.
    pub fn visit(&self, mut visit: impl FnMut(NodeId, &TreeNode)) {
        let mut stack: Vec<NodeId> = self.top_level().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                visit(id, node);
                stack.extend(node.children().iter().rev());
            }
        }
    }

    /// Nodes showing any of `targets`, in tree order. An object linked in
    /// several places yields one node per place.
    pub fn find_nodes(&self, targets: &[ObjectRef]) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.visit(|id, node| match node.label() {
            NodeLabel::Object { object, .. } if targets.contains(object) => found.push(id),
            _ => {}
        });
        found
    }

    /// Pixel sets of the images under `id`, the node itself included.
    pub fn pixels_under(&self, id: NodeId) -> Vec<u64> {
        let mut pixels = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            if let NodeLabel::Object {
                pixels_id: Some(pixels_id),
                ..
            } = node.label()
                && !pixels.contains(pixels_id)
            {
                pixels.push(*pixels_id);
            }
            stack.extend(node.children().iter().rev());
        }
        pixels
    }
}
