use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};

use tracing::{debug, trace};

use crate::service::{Gateway, Result as ServiceResult};

use super::{CallHandle, CallId, CancelToken, LoadCall, LoaderError, Result};

/// Outcome sent back from the worker for one call.
pub type Completion<T> = ServiceResult<T>;

/// A submitted call: the handle to cancel it and the channel its single
/// completion arrives on.
#[derive(Debug)]
pub struct PendingCall<T> {
    pub handle: CallHandle,
    pub receiver: Receiver<Completion<T>>,
}

/// Runs remote calls off the UI thread.
///
/// Each call gets its own channel. Completions are never delivered from the
/// worker: the owning thread drains the channel, so consumers only ever see
/// results on that thread.
#[derive(Clone)]
pub struct CallExecutor {
    gateway: Gateway,
    pool: Arc<rayon::ThreadPool>,
    next_call_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for CallExecutor {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CallExecutor")
            .field("worker_threads", &self.pool.current_num_threads())
            .field("next_call_id", &self.next_call_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl CallExecutor {
    pub fn new(gateway: Gateway, worker_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|index| format!("insight-loader-{index}"))
            .build()
            .map_err(|error| LoaderError::Executor(error.to_string()))?;
        Ok(Self {
            gateway,
            pool: Arc::new(pool),
            next_call_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Queues `call` and returns immediately.
    pub fn submit<L: LoadCall>(&self, call: L) -> PendingCall<L::Output> {
        let id = CallId(self.next_call_id.fetch_add(1, Ordering::Relaxed));
        let description = call.description();
        let token = CancelToken::new();
        let (sender, receiver) = mpsc::channel();

        let worker_token = token.clone();
        let gateway = self.gateway.clone();
        self.pool.spawn(move || {
            if worker_token.is_cancelled() {
                trace!(%id, "skipping cancelled call");
                return;
            }
            let outcome = call.execute(&gateway);
            // The receiver is gone once the request has been dropped.
            let _ = sender.send(outcome);
        });

        debug!(%id, %description, "submitted remote call");
        PendingCall {
            handle: CallHandle::new(id, description, token),
            receiver,
        }
    }
}
