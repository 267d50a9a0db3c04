//! Tracing subscriber setup shared by all binaries.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. `format` is `"json"` for
/// structured output; anything else gives human-readable text.
///
/// # Errors
///
/// Returns an error if `default_level` is not a valid filter directive or a
/// subscriber is already installed.
pub fn init(default_level: &str, format: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if format == "json" {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
