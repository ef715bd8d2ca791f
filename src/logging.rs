//! Logging setup
//!
//! Logs go to stderr so stdout stays clean for stream keys and JSON output.
//! `RUST_LOG` overrides the level chosen by the CLI flags.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the given CLI flags
pub fn default_directive(verbose: bool, log_level: Option<&str>) -> String {
    let level = match log_level.map(|l| l.to_lowercase()) {
        Some(l) if l == "trace" || l == "verbose" => "trace",
        Some(l) if l == "debug" => "debug",
        Some(l) if l == "info" => "info",
        Some(l) if l == "warn" || l == "warning" => "warn",
        Some(l) if l == "error" || l == "critical" => "error",
        _ if verbose => "debug",
        _ => "info",
    };
    format!("streamkey={},warn", level)
}

/// Initialize the global tracing subscriber
pub fn init(verbose: bool, json_output: bool, log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose, log_level)))?;

    let registry = tracing_subscriber::registry().with(filter);

    if json_output {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, None), "streamkey=info,warn");
        assert_eq!(default_directive(true, None), "streamkey=debug,warn");
        assert_eq!(default_directive(true, Some("error")), "streamkey=error,warn");
        assert_eq!(default_directive(false, Some("warning")), "streamkey=warn,warn");
    }
}
