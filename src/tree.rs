mod arena;
mod error;
mod finder;
mod surgery;
mod translator;


pub use arena::{NodeId, NodeLabel, TreeModel, TreeNode};
pub use error::{Result, TreeError};
pub use translator::{ExpandedNodes, ORPHANED_DATASETS};
