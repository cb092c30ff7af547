use thiserror::Error;

use crate::model::ObjectRef;

use super::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown tree node {0:?}")]
    UnknownNode(NodeId),

    #[error("the root node cannot be moved")]
    RootNode,

    #[error("node {node:?} cannot be placed under its own descendant {parent:?}")]
    WouldCycle { node: NodeId, parent: NodeId },

    #[error("nodes must share a parent to be indented together")]
    MixedParents,

    #[error("{0:?} is not readable by the current user")]
    NotReadable(ObjectRef),
}
