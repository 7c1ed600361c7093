//! Tracing subscriber bootstrap.

use bookshop_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to the configured directive.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}

/// Install the global tracing subscriber.
///
/// Calling it twice is not an error; the first subscriber wins.
pub fn init(settings: &TelemetrySettings) {
    let registry = tracing_subscriber::registry().with(env_filter(settings));

    let installed = match settings.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    match installed {
        Ok(()) => tracing::info!(
            target: "bookshop-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        ),
        Err(_) => tracing::debug!(
            target: "bookshop-telemetry",
            "tracing subscriber already installed"
        ),
    }
}
