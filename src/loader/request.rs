use std::cell::RefCell;
use std::rc::Weak;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::service::ServiceError;

use super::{
    CallExecutor, CallHandle, CallId, Completion, Consumer, LoadCall, LoadState, LoaderError,
    Result, StaleReason,
};

/// What happened to a result that reached the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The consumer received the value.
    Delivered,
    /// The consumer was notified of a remote failure.
    Failed(ServiceError),
    /// The result was dropped without touching the consumer.
    Stale(StaleReason),
}

/// One logical load: a single remote call feeding a single consumer.
///
/// The request and its consumer belong to the UI thread. The remote call runs
/// on the executor's workers, and its completion is only picked up by
/// [`AsyncLoadRequest::poll`] or [`AsyncLoadRequest::wait`] on the owning
/// thread. Dropping an in-flight request cancels it.
pub struct AsyncLoadRequest<L: LoadCall, C: Consumer<L::Output> + ?Sized> {
    state: LoadState,
    consumer: Option<Weak<RefCell<C>>>,
    handle: Option<CallHandle>,
    receiver: Option<Receiver<Completion<L::Output>>>,
}

impl<L: LoadCall, C: Consumer<L::Output> + ?Sized> Default for AsyncLoadRequest<L, C> {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            consumer: None,
            handle: None,
            receiver: None,
        }
    }
}

impl<L: LoadCall, C: Consumer<L::Output> + ?Sized> std::fmt::Debug for AsyncLoadRequest<L, C> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AsyncLoadRequest")
            .field("state", &self.state)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<L: LoadCall, C: Consumer<L::Output> + ?Sized> AsyncLoadRequest<L, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn handle(&self) -> Option<&CallHandle> {
        self.handle.as_ref()
    }

    /// Issues the remote call for `target` and returns without blocking.
    pub fn load(
        &mut self,
        executor: &CallExecutor,
        target: Option<L>,
        consumer: Option<Weak<RefCell<C>>>,
    ) -> Result<CallId> {
        if self.state != LoadState::Idle {
            return Err(LoaderError::InvalidState {
                expected: LoadState::Idle,
                actual: self.state,
            });
        }
        let target =
            target.ok_or_else(|| LoaderError::InvalidArgument("no target to load".into()))?;
        let consumer =
            consumer.ok_or_else(|| LoaderError::InvalidArgument("no result consumer".into()))?;
        let live = consumer.upgrade();
        if live.as_ref().is_none_or(|live| live.borrow().is_discarded()) {
            return Err(LoaderError::InvalidArgument(
                "result consumer is already discarded".into(),
            ));
        }

        let pending = executor.submit(target);
        let id = pending.handle.id();
        self.consumer = Some(consumer);
        self.handle = Some(pending.handle);
        self.receiver = Some(pending.receiver);
        self.state = LoadState::InFlight;
        Ok(id)
    }

    /// Cancels an in-flight call. Does nothing in any other state.
    pub fn cancel(&mut self) {
        if self.state != LoadState::InFlight {
            return;
        }
        if let Some(handle) = &self.handle {
            handle.cancel();
            info!(id = %handle.id(), description = handle.description(), "load cancelled");
        }
        self.state = LoadState::Cancelled;
    }

    /// Hands a completion to the consumer, unless the request was cancelled
    /// or the consumer has been torn down in the meantime.
    pub fn on_result(&mut self, value: Completion<L::Output>) -> Delivery {
        self.receiver = None;
        if self.state != LoadState::InFlight {
            let reason = if self.state == LoadState::Cancelled {
                StaleReason::Cancelled
            } else {
                StaleReason::NotInFlight
            };
            return self.drop_stale(reason);
        }

        let consumer = self.consumer.as_ref().and_then(Weak::upgrade);
        let Some(consumer) = consumer.filter(|consumer| !consumer.borrow().is_discarded()) else {
            self.state = LoadState::Cancelled;
            return self.drop_stale(StaleReason::ConsumerDiscarded);
        };

        self.state = LoadState::Completed;
        match value {
            Ok(value) => {
                consumer.borrow_mut().set_result(value);
                debug!(id = ?self.handle.as_ref().map(CallHandle::id), "result delivered");
                Delivery::Delivered
            }
            Err(error) => {
                warn!(id = ?self.handle.as_ref().map(CallHandle::id), %error, "remote call failed");
                consumer.borrow_mut().set_error(&error);
                Delivery::Failed(error)
            }
        }
    }

    /// Picks up the completion if it has arrived. Call from the owning thread.
    pub fn poll(&mut self) -> Option<Delivery> {
        let received = match self.receiver.as_ref()?.try_recv() {
            Ok(value) => value,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                if self.state != LoadState::InFlight {
                    return None;
                }
                Err(lost_call())
            }
        };
        Some(self.on_result(received))
    }

    /// Blocks the calling thread until the completion arrives.
    pub fn wait(&mut self, timeout: Duration) -> Result<Delivery> {
        let Some(receiver) = self.receiver.as_ref() else {
            return Err(LoaderError::InvalidState {
                expected: LoadState::InFlight,
                actual: self.state,
            });
        };
        let received = match receiver.recv_timeout(timeout) {
            Ok(value) => value,
            Err(RecvTimeoutError::Timeout) => return Err(LoaderError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                self.receiver = None;
                if self.state != LoadState::InFlight {
                    return Ok(Delivery::Stale(StaleReason::Cancelled));
                }
                Err(lost_call())
            }
        };
        Ok(self.on_result(received))
    }

    fn drop_stale(&self, reason: StaleReason) -> Delivery {
        debug!(
            id = ?self.handle.as_ref().map(CallHandle::id),
            ?reason,
            "dropping stale result"
        );
        Delivery::Stale(reason)
    }
}

impl<L: LoadCall, C: Consumer<L::Output> + ?Sized> Drop for AsyncLoadRequest<L, C> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lost_call() -> ServiceError {
    ServiceError::ServiceUnavailable("remote call ended without a result".into())
}
