use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "jmdict_bot=info";

/// Installs the process-wide subscriber. `RUST_LOG` wins over `filter`, which
/// wins over [`DEFAULT_FILTER`]. Calling this twice is harmless.
pub fn init(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
