//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `extsort=trace`.
pub const LOG_ENV: &str = "EXTSORT_LOG";

/// Installs the global subscriber, writing to stderr.
///
/// `EXTSORT_LOG` wins when set; otherwise `debug` with `verbose`, `warn` without.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
