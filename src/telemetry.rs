//! Tracing subscriber setup for controllers embedding the aggregator
//!
//! Logs are structured JSON by default so the per-child fields (`kind`,
//! `namespace`, `name`, `status`) stay queryable. Set
//! `ADDON_STATUS_LOG_FORMAT=text` for human-readable output.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format (`json` or `text`)
pub const LOG_FORMAT_ENV: &str = "ADDON_STATUS_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info,addon_status=debug,kube=info,tower=warn,hyper=warn";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on startup (e.g., "dashboard-controller")
    pub service_name: String,

    /// Emit JSON lines instead of plain text
    pub json: bool,

    /// Filter used when `RUST_LOG` is unset or invalid
    pub default_directive: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "addon-status".to_string(),
            json: json_from_env(std::env::var(LOG_FORMAT_ENV).ok().as_deref()),
            default_directive: DEFAULT_DIRECTIVE.to_string(),
        }
    }
}

fn json_from_env(value: Option<&str>) -> bool {
    !matches!(value, Some(v) if v.eq_ignore_ascii_case("text"))
}

/// Build the env filter, preferring `RUST_LOG` over the configured default
pub fn env_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_directive))
}

/// Initialize the global tracing subscriber
///
/// # Example
///
/// ```ignore
/// use addon_status::telemetry::{init_telemetry, TelemetryConfig};
///
/// let config = TelemetryConfig {
///     service_name: "dashboard-controller".to_string(),
///     ..Default::default()
/// };
/// init_telemetry(config)?;
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    // Option<Layer> implements Layer, so exactly one formatter is active
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
    });
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter(&config))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    tracing::info!(service = %config.service_name, json = config.json, "telemetry initialized");
    Ok(())
}
