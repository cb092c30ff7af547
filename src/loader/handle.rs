use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared with the worker running a call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "call-{}", self.0)
    }
}

/// Cancellable reference to an in-flight remote call.
#[derive(Debug)]
pub struct CallHandle {
    id: CallId,
    description: String,
    token: CancelToken,
}

impl CallHandle {
    pub(crate) fn new(id: CallId, description: String, token: CancelToken) -> Self {
        Self {
            id,
            description,
            token,
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Asks the worker to skip the call. Work already started on the remote
    /// side still runs to completion.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
