use crate::loader::{LoaderError, StaleReason};
use crate::model::CoreError;
use crate::service::{CatalogError, ServiceError};
use crate::tree::TreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("model error: {0}")]
    Core(#[from] CoreError),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("load was dropped before its result was used ({0:?})")]
    Stale(StaleReason),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("YAML serialization failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("image encoding failure: {0}")]
    Image(#[from] image::ImageError),
}
