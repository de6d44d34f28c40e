use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::scan::{FieldSpec, ScanLimits};

/// Top-level configuration, deserializable from TOML. Built once at process
/// start and passed by reference into every operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SondaConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub scan: ScanConfig,
    pub telemetry: TelemetryConfig,
}

/// Server configuration (gRPC listen address).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Queue names the operations act on. Empty names are reported as
/// configuration errors when an operation needs them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub queue_name: String,
    pub session_queue_name: String,
}

/// Scan budget and the location of the order number on a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub default_max_to_scan: usize,
    /// Capped at 50 whatever the configured value.
    pub batch_size: usize,
    pub order_attribute: String,
    pub order_body_path: String,
}

/// Log output settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty in debug builds, JSON in release builds.
    #[default]
    Auto,
    Pretty,
    Json,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_format: LogFormat::Auto,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5660".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_max_to_scan: ScanLimits::DEFAULT_MAX_TO_SCAN,
            batch_size: ScanLimits::MAX_BATCH_SIZE,
            order_attribute: "orderNumber".to_string(),
            order_body_path: "header.orderNumber".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn order_field(&self) -> FieldSpec {
        FieldSpec::new(&self.order_attribute, &self.order_body_path)
    }

    /// Normalize a caller budget: non-positive values use the configured default.
    pub fn limits(&self, max_to_scan: i64) -> ScanLimits {
        let max = if max_to_scan > 0 {
            max_to_scan
        } else {
            i64::try_from(self.default_max_to_scan).unwrap_or(i64::MAX)
        };
        ScanLimits::new(max, self.batch_size)
    }
}

impl SondaConfig {
    /// Candidate config file locations, in lookup order.
    pub const SEARCH_PATHS: [&'static str; 2] = ["sonda.toml", "/etc/sonda/sonda.toml"];

    /// Parse a config file. A missing file is an error here; use `discover`
    /// to fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load the first config file found in `SEARCH_PATHS`, or defaults.
    /// Returns the path that was loaded, if any.
    pub fn discover() -> Result<(Self, Option<&'static str>), ConfigError> {
        for path in Self::SEARCH_PATHS {
            if Path::new(path).exists() {
                return Ok((Self::from_file(path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}
