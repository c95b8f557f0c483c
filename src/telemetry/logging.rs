//! Log level mapping and subscriber installation.
//!
//! `log_config.level` accepts `debug`, `info`, or `error` (§6). Anything
//! else falls back to `info` with a warning, mirroring the Go source's
//! `getLogLevel` in `main.go`.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Map the configured level string to a `tracing::Level`, defaulting to
/// `info` (and logging that the default was applied) for anything
/// unrecognized.
pub fn log_level_filter(level: &str) -> Level {
    match level {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "log_config.level '{other}' not recognized, defaulting to 'info'"
            );
            Level::INFO
        }
    }
}

/// Install the global `tracing` subscriber at the given level. Call once
/// at process startup, before any provider is constructed.
pub fn init_subscriber(level: &str) {
    let level = log_level_filter(level);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_levels() {
        assert_eq!(log_level_filter("debug"), Level::DEBUG);
        assert_eq!(log_level_filter("info"), Level::INFO);
        assert_eq!(log_level_filter("error"), Level::ERROR);
    }

    #[test]
    fn unknown_level_defaults_to_info() {
        assert_eq!(log_level_filter("trace"), Level::INFO);
        assert_eq!(log_level_filter(""), Level::INFO);
    }
}
