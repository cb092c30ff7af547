use std::time::Duration;

use thiserror::Error;

use super::LoadState;

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Local loader failures. These fail fast in the caller's thread; remote
/// failures travel to the consumer instead.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid loader argument: {0}")]
    InvalidArgument(String),

    #[error("loader is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: LoadState,
        actual: LoadState,
    },

    #[error("no result within {0:?}")]
    Timeout(Duration),

    #[error("executor failure: {0}")]
    Executor(String),
}
