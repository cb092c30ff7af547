use std::collections::BTreeMap;

use crate::model::{ContainerKind, DataObject};

use super::Result;

/// Remote hierarchy browsing service.
pub trait DataService: Send + Sync {
    /// Containers of `kind` readable by `user_id`, with their children.
    /// An empty `ids` slice loads every readable container of that kind.
    fn load_hierarchy(
        &self,
        kind: ContainerKind,
        ids: &[u64],
        user_id: u64,
        group_id: u64,
    ) -> Result<Vec<DataObject>>;

    /// Number of images held by each container.
    fn get_collection_count(
        &self,
        kind: ContainerKind,
        ids: &[u64],
    ) -> Result<BTreeMap<u64, usize>>;
}
