//! Log output for the command-line tool.

use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for the given verbosity.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber, writing to stdout.
///
/// `RUST_LOG` takes precedence over `debug`. Returns `false`, after logging a
/// warning through the installed subscriber, when one was already set.
pub fn init_logging(debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    match fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            warn!("Keeping the existing log subscriber: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "info");
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        init_logging(false);
        assert!(!init_logging(true));
    }
}
