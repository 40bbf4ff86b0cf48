//! Diagnostic logging.
//!
//! Events go to stderr so they never mix with rendered views on stdout.
//! `RUST_LOG` wins over the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::schema::LoggingConfig;

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(&config.level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Initialize logging for tests (captured by the test harness).
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parse a level or directive string, falling back to `warn`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_filter_falls_back_on_garbage() {
        let fallback = EnvFilter::new("warn").to_string();
        assert_eq!(build_filter("daec=[[").to_string(), fallback);
        assert_ne!(build_filter("daec=debug").to_string(), fallback);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_test();
        init(&LoggingConfig::default());
    }
}
