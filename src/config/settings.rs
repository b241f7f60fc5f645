use serde::Deserialize;
use std::collections::HashMap;

use crate::utils::constants::{DEFAULT_AUDIENCE, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WECHAT_API_ROOT};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// ================================
/// Upstream provider
/// ================================
/// Credentials stay optional here: a missing one is reported by the client
/// when an issuance call needs it.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_root")]
    pub api_root: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            app_id: None,
            app_secret: None,
            timeout_ms: None,
        }
    }
}

/// ================================
/// Inbound bearer verification
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_audience")]
    pub audience: String,
    /// kid -> HMAC secret
    #[serde(default)]
    pub keys: HashMap<String, String>,
    /// look up unknown kids in `JWT_KEY_<kid>`
    #[serde(default = "default_true")]
    pub keys_from_env: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            audience: default_audience(),
            keys: HashMap::new(),
            keys_from_env: true,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_api_root() -> Option<String> {
    Some(DEFAULT_WECHAT_API_ROOT.to_string())
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_true() -> bool {
    true
}
