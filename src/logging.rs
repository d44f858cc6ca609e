use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter, e.g. `spinbox_engine_lib=debug`.
pub const LOG_ENV: &str = "SPINBOX_LOG";

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
