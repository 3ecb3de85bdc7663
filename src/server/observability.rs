//! Structured logging setup.
//!
//! Tracing is initialized once, after the configuration merge, so the
//! effective `loglevel` setting governs the subscriber. `RUST_LOG` still
//! wins when set, for ad-hoc debugging.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing at `level`, optionally with JSON output.
///
/// # Panics
///
/// Panics if a tracing subscriber has already been installed in this
/// process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(level, json, "tracing initialized");
}
