mod config;
mod context;
mod error;
mod io;
mod logging;

#[cfg(test)]
mod tests;

pub use config::{ClientConfig, load_config};
pub use context::AppContext;
pub use error::{AppError, Result};
pub use io::{save_output, save_png};
pub use logging::{LOG_ENV, init_tracing};
