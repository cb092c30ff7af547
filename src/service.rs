mod catalog;
mod data;
mod error;
mod gateway;
mod image;
mod memory;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, load_catalog};
pub use data::DataService;
pub use error::{CatalogError, CatalogResult, Result, ServiceError};
pub use gateway::Gateway;
pub use image::{ImageService, RenderingControl, SettingsOutcome};
pub use memory::InMemoryGateway;
