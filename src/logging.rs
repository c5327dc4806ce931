use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directives for the launcher's own log output.
pub const LOG_ENV: &str = "BUNDLE_LAUNCHER_LOG";

/// Sends launcher logs to stderr, `warn` and above unless `BUNDLE_LAUNCHER_LOG`
/// says otherwise. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
