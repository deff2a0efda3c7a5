use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Install the global tracing subscriber for the admin layer.
///
/// The filter comes from `RUST_LOG` when set, otherwise from the configured
/// default. Output is human-readable unless the config asks for JSON lines.
/// Calling this more than once is harmless: the first subscriber wins, so
/// library consumers and test setups can both initialize freely.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
