use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `insight_client=debug`.
pub const LOG_ENV: &str = "INSIGHT_LOG";

/// Installs the global subscriber. Only binaries call this; a second call is
/// ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
