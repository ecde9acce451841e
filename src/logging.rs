//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output or
//! pretty-printed output. Logs go to stderr so command output on stdout
//! stays machine-readable. Format is auto-detected from the terminal but
//! can be forced via `--log-json` or `--log-pretty`.

use std::io::IsTerminal;

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{LogArgs, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::stderr().is_terminal() {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = Targets::new().with_default(level.to_tracing_level());

    // `try_init` so repeated initialisation (tests, embedding) is harmless
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "logging already initialised");
    }
}

/// Initialise from the global CLI flags.
pub fn init_from_args(args: &LogArgs) {
    init(&args.log_level, resolve_format(args.log_pretty, args.log_json));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn second_init_is_harmless() {
        init(&LogLevel::Error, LogFormat::Json);
        init(&LogLevel::Error, LogFormat::Pretty);
    }
}
