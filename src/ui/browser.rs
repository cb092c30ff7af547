use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::loader::{
    AsyncLoadRequest, CallExecutor, CallId, Consumer, ContainerCountCall, ContainerCounts,
    Delivery, HierarchyCall, LoadState, LoaderError, Result,
};
use crate::model::{ContainerKind, DataObject, ObjectKind, ObjectRef};
use crate::service::ServiceError;
use crate::tree::{NodeId, TreeModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserState {
    #[default]
    New,
    Loading,
    Ready,
    Discarded,
}

/// Display state of a hierarchy browser. Fed by the browser's loaders on the
/// UI thread.
#[derive(Debug)]
pub struct BrowserModel {
    state: BrowserState,
    user_id: u64,
    group_id: u64,
    tree: TreeModel,
    pending_node: Option<NodeId>,
    counts: BTreeMap<(ContainerKind, u64), usize>,
    last_error: Option<ServiceError>,
}

impl BrowserModel {
    pub fn new(user_id: u64, group_id: u64) -> Self {
        Self {
            state: BrowserState::New,
            user_id,
            group_id,
            tree: TreeModel::new(),
            pending_node: None,
            counts: BTreeMap::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> BrowserState {
        self.state
    }

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TreeModel {
        &mut self.tree
    }

    pub fn count(&self, kind: ContainerKind, id: u64) -> Option<usize> {
        self.counts.get(&(kind, id)).copied()
    }

    pub fn last_error(&self) -> Option<&ServiceError> {
        self.last_error.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        self.state == BrowserState::Discarded
    }

    /// Once discarded the model ignores every late result.
    pub fn discard(&mut self) {
        self.state = BrowserState::Discarded;
    }

    fn start_loading(&mut self, node: Option<NodeId>) {
        self.state = BrowserState::Loading;
        self.pending_node = node;
        self.last_error = None;
    }
}

impl Consumer<Vec<DataObject>> for BrowserModel {
    fn set_result(&mut self, roots: Vec<DataObject>) {
        let (user_id, group_id) = (self.user_id, self.group_id);
        let outcome = match self.pending_node.take() {
            Some(node) => match roots.first() {
                Some(object) => self.tree.replace_children(node, object, user_id, group_id),
                None => Ok(()),
            },
            None => self.tree.refresh_hierarchy(&roots, user_id, group_id),
        };
        if let Err(error) = outcome {
            warn!(%error, "loaded hierarchy could not be displayed");
        }
        self.state = BrowserState::Ready;
    }

    fn set_error(&mut self, error: &ServiceError) {
        self.pending_node = None;
        self.last_error = Some(error.clone());
        self.state = BrowserState::Ready;
    }

    fn is_discarded(&self) -> bool {
        self.state == BrowserState::Discarded
    }
}

impl Consumer<ContainerCounts> for BrowserModel {
    fn set_result(&mut self, value: ContainerCounts) {
        for (id, count) in value.counts {
            self.counts.insert((value.kind, id), count);
            let target = ObjectRef {
                kind: ObjectKind::Container(value.kind),
                id,
            };
            for node in self.tree.find_nodes(&[target]) {
                if let Err(error) = self.tree.set_item_count(node, Some(count)) {
                    debug!(%error, "count for a node that went away");
                }
            }
        }
    }

    fn set_error(&mut self, error: &ServiceError) {
        self.last_error = Some(error.clone());
    }

    fn is_discarded(&self) -> bool {
        self.state == BrowserState::Discarded
    }
}

/// Owns a [`BrowserModel`] and the loaders feeding it.
///
/// Starting a load replaces the previous request of the same family, which
/// cancels it. Call [`Browser::poll`] from the UI loop to hand completed
/// results to the model.
#[derive(Debug)]
pub struct Browser {
    executor: CallExecutor,
    model: Rc<RefCell<BrowserModel>>,
    hierarchy: Option<AsyncLoadRequest<HierarchyCall, BrowserModel>>,
    counts: Option<AsyncLoadRequest<ContainerCountCall, BrowserModel>>,
}

impl Browser {
    pub fn new(executor: CallExecutor, user_id: u64, group_id: u64) -> Self {
        Self {
            executor,
            model: Rc::new(RefCell::new(BrowserModel::new(user_id, group_id))),
            hierarchy: None,
            counts: None,
        }
    }

    pub fn model(&self) -> Ref<'_, BrowserModel> {
        self.model.borrow()
    }

    pub fn hierarchy_state(&self) -> LoadState {
        self.hierarchy
            .as_ref()
            .map(AsyncLoadRequest::state)
            .unwrap_or_default()
    }

    /// Loads every readable container of `kind`, or only `ids` when given.
    pub fn load_roots(&mut self, kind: ContainerKind, ids: Vec<u64>) -> Result<CallId> {
        let (user_id, group_id) = {
            let model = self.model.borrow();
            (model.user_id, model.group_id)
        };
        let call = HierarchyCall {
            kind,
            ids,
            user_id,
            group_id,
        };
        self.issue_hierarchy(call, None)
    }

    /// Reloads the contents of a container already shown in the tree.
    pub fn load_node(&mut self, node: NodeId) -> Result<CallId> {
        let call = {
            let model = self.model.borrow();
            let shown = model
                .tree
                .get(node)
                .map_err(|error| LoaderError::InvalidArgument(error.to_string()))?;
            let (Some(kind), Some(object)) = (shown.container_kind(), shown.object()) else {
                return Err(LoaderError::InvalidArgument(format!(
                    "{} has no contents to load",
                    shown.name()
                )));
            };
            HierarchyCall {
                kind,
                ids: vec![object.id],
                user_id: model.user_id,
                group_id: model.group_id,
            }
        };
        self.issue_hierarchy(call, Some(node))
    }

    /// Counts the images of every shown container of `kind`.
    pub fn count_items(&mut self, kind: ContainerKind) -> Result<CallId> {
        let targets: Vec<ObjectRef> = {
            let model = self.model.borrow();
            let mut targets = Vec::new();
            model.tree.visit(|_, node| {
                if node.container_kind() == Some(kind)
                    && let Some(object) = node.object()
                {
                    targets.push(object);
                }
            });
            targets
        };
        let call = ContainerCountCall::new(&targets)?;
        let mut request = AsyncLoadRequest::new();
        let id = request.load(&self.executor, Some(call), Some(Rc::downgrade(&self.model)))?;
        self.counts = Some(request);
        Ok(id)
    }

    /// Hands over whatever has completed since the last poll.
    pub fn poll(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        if let Some(request) = self.hierarchy.as_mut() {
            deliveries.extend(request.poll());
        }
        if let Some(request) = self.counts.as_mut() {
            deliveries.extend(request.poll());
        }
        deliveries
    }

    /// Blocks until every in-flight load has completed.
    pub fn wait(&mut self, timeout: Duration) -> Result<Vec<Delivery>> {
        let mut deliveries = Vec::new();
        if let Some(request) = self.hierarchy.as_mut()
            && request.state() == LoadState::InFlight
        {
            deliveries.push(request.wait(timeout)?);
        }
        if let Some(request) = self.counts.as_mut()
            && request.state() == LoadState::InFlight
        {
            deliveries.push(request.wait(timeout)?);
        }
        Ok(deliveries)
    }

    pub fn cancel(&mut self) {
        if let Some(request) = self.hierarchy.as_mut() {
            request.cancel();
        }
        if let Some(request) = self.counts.as_mut() {
            request.cancel();
        }
        let mut model = self.model.borrow_mut();
        if model.state == BrowserState::Loading {
            model.state = BrowserState::Ready;
            model.pending_node = None;
        }
    }

    pub fn discard(&mut self) {
        self.cancel();
        self.model.borrow_mut().discard();
    }

    fn issue_hierarchy(&mut self, call: HierarchyCall, node: Option<NodeId>) -> Result<CallId> {
        if self.model.borrow().is_discarded() {
            return Err(LoaderError::InvalidArgument("browser was discarded".into()));
        }
        if let Some(mut previous) = self.hierarchy.take() {
            previous.cancel();
        }
        let mut request = AsyncLoadRequest::new();
        let id = request.load(&self.executor, Some(call), Some(Rc::downgrade(&self.model)))?;
        self.model.borrow_mut().start_loading(node);
        self.hierarchy = Some(request);
        Ok(id)
    }
}
