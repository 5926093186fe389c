use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LEVEL: &str = "warn";

// stderr keeps events off the report and prompts; RUST_LOG overrides the level.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
