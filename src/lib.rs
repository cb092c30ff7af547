pub mod cli;
pub mod loader;
pub mod model;
pub mod runtime;
pub mod service;
pub mod tree;
pub mod ui;

pub fn run_cli() -> Result<(), String> {
    cli::run_cli()
}
