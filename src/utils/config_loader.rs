use anyhow::{anyhow, Result};
use std::path::Path;

use crate::config::proc_loader::file_to_config;
use crate::config::settings::ServiceConfig;

/// Load the config file and apply the CLI port override.
pub async fn run(config_path: &str, port_override: Option<u16>) -> Result<ServiceConfig> {
    let path = Path::new(config_path);
    let mut service_config = file_to_config(path)
        .await
        .map_err(|e| anyhow!("Invalid config format: {}", e))?;

    if let Some(port) = port_override {
        service_config.settings.server.port = port.to_string();
    }
    Ok(service_config)
}
