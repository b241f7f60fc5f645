//! Configuration validation with aggregated errors.
//!
//! Structural problems are collected into one list and fail startup.
//! Missing upstream credentials only produce warnings: the upstream client
//! reports them per request.

use tracing::warn;

use crate::config::settings::{AuthConfig, ServiceConfig, SettingsConfig, UpstreamConfig};
use crate::utils::constants::{ACCESS_TOKEN_PATH, TICKET_PATH};

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_upstream(&cfg.upstream, &mut errors);
    validate_auth(&cfg.auth, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }
    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if settings.metrics.is_enabled && [ACCESS_TOKEN_PATH, TICKET_PATH].contains(&settings.metrics.path.as_str()) {
        errors.push(format!(
            "settings.metrics.path '{}' collides with a credential route",
            settings.metrics.path
        ));
    }
    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!("settings.logging.level '{}' is not supported", logging.level));
        }
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<String>) {
    if let Some(root) = upstream.api_root.as_deref().filter(|r| !r.trim().is_empty()) {
        if !(root.starts_with("http://") || root.starts_with("https://")) {
            errors.push(format!("upstream.api_root '{}' must be an http(s) URL", root));
        }
    } else {
        warn!("upstream.api_root is not set; every issuance will fail");
    }
    if upstream.timeout_ms == Some(0) {
        errors.push("upstream.timeout_ms must be greater than 0".to_string());
    }
    if is_blank(&upstream.app_id) {
        warn!("upstream.app_id is not set; access token issuance will fail");
    }
    if is_blank(&upstream.app_secret) {
        warn!("upstream.app_secret is not set; access token issuance will fail");
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    if auth.audience.trim().is_empty() {
        errors.push("auth.audience must not be empty".to_string());
    }
    for (kid, secret) in &auth.keys {
        if secret.is_empty() {
            errors.push(format!("auth.keys['{}'] has an empty secret", kid));
        }
    }
    if auth.keys.is_empty() && !auth.keys_from_env {
        warn!("no auth keys configured and env lookup disabled; every request will be rejected");
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
