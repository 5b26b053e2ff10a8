//! Agent configuration schema and validation.
//!
//! Pure types only; loading from disk lives in `infra::config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Step time `rpc activate` must leave free for the CIRA poll and the
/// result report.
pub const ACTIVATION_STEP_RESERVE_SECS: u64 = 15;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration, stored as YAML (default `/etc/pma/config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identity of this host as known by the Device-Manager.
    pub host_id: String,
    /// `host[:port]` of the Remote Provisioning Server.
    pub rps_address: String,
    /// Seconds between reconciliation steps; also each step's deadline, so it
    /// must exceed `tool.activation_timeout_secs`.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub device_manager: DeviceManagerConfig,
    #[serde(default)]
    pub tool: ToolConfig,
}

/// Device-Manager endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceManagerConfig {
    /// `https://host:port` (or `http://` with TLS disabled).
    pub url: String,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// File holding a JWT sent as a bearer token; re-read on every call.
    #[serde(default)]
    pub access_token_path: Option<PathBuf>,
    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS material for the Device-Manager channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    /// Client certificate; together with `client_key` enables mTLS.
    #[serde(default)]
    pub client_cert: Option<PathBuf>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ca_cert: None,
            client_cert: None,
            client_key: None,
        }
    }
}

impl TlsConfig {
    /// Whether a client identity is configured.
    #[must_use]
    pub fn is_mtls(&self) -> bool {
        self.client_cert.is_some() && self.client_key.is_some()
    }
}

/// The `rpc` activation tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_tool_binary")]
    pub binary: String,
    #[serde(default = "default_amtinfo_timeout_secs")]
    pub amtinfo_timeout_secs: u64,
    /// Timeout for `activate` and `deactivate`.
    #[serde(default = "default_activation_timeout_secs")]
    pub activation_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: default_tool_binary(),
            amtinfo_timeout_secs: default_amtinfo_timeout_secs(),
            activation_timeout_secs: default_activation_timeout_secs(),
        }
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_tool_binary() -> String {
    "rpc".to_string()
}

fn default_amtinfo_timeout_secs() -> u64 {
    30
}

fn default_activation_timeout_secs() -> u64 {
    90
}

// ── Accessors ────────────────────────────────────────────────────────────────

impl AgentConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    #[must_use]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.device_manager.rpc_timeout_secs)
    }

    /// Validate cross-field constraints the YAML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_id.trim().is_empty() {
            return Err(ConfigError::Missing("host_id"));
        }
        validate_rps_address(&self.rps_address)?;
        for (field, value) in [
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("device_manager.rpc_timeout_secs", self.device_manager.rpc_timeout_secs),
            ("tool.amtinfo_timeout_secs", self.tool.amtinfo_timeout_secs),
            ("tool.activation_timeout_secs", self.tool.activation_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(field));
            }
        }
        let needed = self
            .tool
            .activation_timeout_secs
            .saturating_add(ACTIVATION_STEP_RESERVE_SECS);
        if needed >= self.heartbeat_interval_secs {
            return Err(ConfigError::ActivationOutlastsStep {
                activation_secs: self.tool.activation_timeout_secs,
                reserve_secs: ACTIVATION_STEP_RESERVE_SECS,
                heartbeat_secs: self.heartbeat_interval_secs,
            });
        }
        if self.tool.binary.trim().is_empty() {
            return Err(ConfigError::Missing("tool.binary"));
        }
        validate_device_manager(&self.device_manager)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

fn validate_rps_address(addr: &str) -> Result<(), ConfigError> {
    if addr.trim().is_empty() {
        return Err(ConfigError::Missing("rps_address"));
    }
    if addr.contains("://") || addr.contains('/') || addr.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidRpsAddress(addr.to_string()));
    }
    Ok(())
}

fn validate_device_manager(dm: &DeviceManagerConfig) -> Result<(), ConfigError> {
    let tls = &dm.tls;
    let https = if dm.url.starts_with("https://") {
        true
    } else if dm.url.starts_with("http://") {
        false
    } else {
        return Err(ConfigError::InvalidUrl(dm.url.clone()));
    };
    if https != tls.enabled {
        return Err(ConfigError::SchemeMismatch {
            url: dm.url.clone(),
            tls_enabled: tls.enabled,
        });
    }
    if tls.enabled && tls.ca_cert.is_none() {
        return Err(ConfigError::Missing("device_manager.tls.ca_cert"));
    }
    if tls.client_cert.is_some() != tls.client_key.is_some() {
        return Err(ConfigError::IncompleteClientIdentity);
    }
    Ok(())
}
