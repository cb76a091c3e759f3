//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the verbosity flags. Logs go to stderr so that
//! `config` and `selectors` output stays pipeable.

use tracing_subscriber::EnvFilter;

use crate::commands::LogFormat;
use crate::config::Verbosity;

/// Install the global subscriber; a second call is a no-op
pub fn init_tracing(verbosity: Verbosity, format: LogFormat, ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_verbose());

    let _ = match format {
        LogFormat::Text => builder.with_ansi(ansi).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
