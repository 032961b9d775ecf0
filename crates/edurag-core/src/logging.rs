use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Verbosity follows `RUST_LOG`, default `info`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
