// src/logging.rs
//
// Diagnostic logging for the harness.
// - tracing fmt layer on stderr, so stdout stays free for the console summary
// - filter built from the resolved level only; the environment is not consulted

use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::eval::config::DebugSettings;

const FALLBACK_LEVEL: &str = "info";

/// Level to run at: `debug` when debug mode is on, otherwise the configured
/// `debug.trace_level`.
pub fn resolve_level(settings: &DebugSettings, debug_flag: bool) -> String {
    if debug_flag || settings.enabled {
        "debug".to_string()
    } else {
        settings.trace_level.to_ascii_lowercase()
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, embedding).
pub fn init_logging(level: &str) -> bool {
    let ansi = std::io::stderr().is_terminal();
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_target(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_level() {
        let mut settings = DebugSettings::default();
        assert_eq!(resolve_level(&settings, false), "info");
        assert_eq!(resolve_level(&settings, true), "debug");

        settings.trace_level = "WARN".to_string();
        assert_eq!(resolve_level(&settings, false), "warn");

        settings.enabled = true;
        assert_eq!(resolve_level(&settings, false), "debug");
    }
}
