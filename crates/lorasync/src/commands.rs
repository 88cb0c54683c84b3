//! One-shot command handlers.

use std::path::Path;

use lorasync_config::{Config, config_path, load_config, to_toml};
use lorasync_core::{UpsertDeviceRequest, is_valid_eui};

use crate::cli::ConfigCommand;
use crate::error::CliError;
use crate::service::Engine;

pub async fn upsert_device(cfg: &Config, request: UpsertDeviceRequest) -> Result<(), CliError> {
    let engine = Engine::from_config(cfg)?;
    let rows = engine.fanout.upsert_device(&request).await?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

pub fn check_eui(value: &str) -> Result<(), CliError> {
    if is_valid_eui(value) {
        println!("valid");
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "EUI".into(),
            reason: format!("'{value}' is not 16, 32 or 64 hex characters"),
        })
    }
}

pub fn config(command: &ConfigCommand, path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommand::Path => {
            let path = path.map_or_else(config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Show => {
            let mut cfg = load_config(path)?;
            redact(&mut cfg);
            print!("{}", to_toml(&cfg)?);
        }
    }
    Ok(())
}

fn redact(cfg: &mut Config) {
    const MASK: &str = "********";
    if cfg.platform.api_token.is_some() {
        cfg.platform.api_token = Some(MASK.into());
    }
    for tenant in &mut cfg.tenants {
        if tenant.api_token.is_some() {
            tenant.api_token = Some(MASK.into());
        }
    }
}
