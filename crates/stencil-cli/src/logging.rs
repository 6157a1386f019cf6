//! Log sink for one command run

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "STENCIL_LOG";

/// Default level for a `-v` count
#[must_use]
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// stderr subscriber filtered by `$STENCIL_LOG`, else by `verbosity`
///
/// Meant for `tracing::subscriber::with_default`; nothing is installed
/// globally.
#[must_use]
pub fn subscriber(verbosity: u8) -> impl Subscriber + Send + Sync {
    let default_level = level_for(verbosity);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV)
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}
