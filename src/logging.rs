//! Diagnostic logging.
//!
//! Logs go to stderr in compact format so that stdout stays reserved for
//! command output such as the dry-run plan. `RUST_LOG`, when set, overrides
//! the `--log-level` flag.

use crate::cli::LogLevel;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for `level`, scoped to this crate.
fn directive(level: LogLevel) -> String {
    format!("termis={}", level.as_str())
}

/// Install the global subscriber.
///
/// ```bash
/// RUST_LOG=termis=debug termis --dry-run
/// ```
pub fn init(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_scopes_to_crate() {
        assert_eq!(directive(LogLevel::Info), "termis=info");
        assert_eq!(directive(LogLevel::Warn), "termis=warn");
    }
}
