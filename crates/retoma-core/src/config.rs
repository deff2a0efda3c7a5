use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration for the admin layer, deserializable from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub kernel: KernelConfig,
    pub flow_control: FlowControlConfig,
    pub telemetry: TelemetryConfig,
}

/// Kernel identity and placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Node identifier used in storage-queue name resolution.
    pub node_id: String,
    /// Name of the dead-letter destination on this node.
    pub dead_letter_destination: String,
}

/// Resource-monitor thresholds. The monitor blocks every registered
/// flow-control channel when the stored message count crosses
/// `high_watermark` and unblocks when it falls back below `low_watermark`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowControlConfig {
    pub high_watermark: u64,
    pub low_watermark: u64,
    pub poll_interval_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            node_id: "node-0".to_string(),
            dead_letter_destination: "DeadLetterChannel".to_string(),
        }
    }
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self {
            high_watermark: 100_000,
            low_watermark: 80_000,
            poll_interval_ms: 100,
        }
    }
}

/// Logging output settings, consumed by `telemetry::init`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default level filter when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl AdminConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}
