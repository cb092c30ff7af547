use crate::model::{CoreError, ObjectKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failure of a remote call. These reach the consumer as a notification and
/// are never retried automatically.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{kind:?} {id} not found")]
    NotFound { kind: ObjectKind, id: u64 },

    #[error("rendering failed: {0}")]
    Rendering(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<CoreError> for ServiceError {
    fn from(error: CoreError) -> Self {
        ServiceError::InvalidRequest(error.to_string())
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("catalog YAML serialization failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),

    #[error("invalid catalog entry: {0}")]
    Core(#[from] CoreError),
}
