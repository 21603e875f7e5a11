/// Logging setup for the binary.
///
/// Library code only emits `tracing` events; the subscriber is installed
/// once here. `RUST_LOG` overrides the level given on the command line.
/// Logs go to stderr so stdout stays clean for reports and CSV.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console lines.
    #[default]
    Human,
    /// One JSON object per event.
    Json,
}

/// Builds the filter: `RUST_LOG` if set, else `wellmon_service=<level>`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wellmon_service={}", level)))
}

/// Installs the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = build_filter(level);
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Human => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging("debug", LogFormat::Human);
        init_logging("info", LogFormat::Json);
    }

    #[test]
    fn test_default_format_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }
}
