use std::path::Path;

use anyhow::{Context, Result};
use termion::color::{Fg, Reset, Yellow};

use crate::config::{self, Backend, BackendConfig};

pub struct Changes {
    pub backend: Option<Backend>,
    pub custom_cmd: Option<String>,
    pub store_path: Option<String>,
    pub software_fallback: Option<bool>,
}

pub fn show(config: &BackendConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}

pub fn path(config_path: &Path) -> Result<()> {
    println!("{}", config_path.display());

    Ok(())
}

pub fn set(mut config: BackendConfig, config_path: &Path, changes: Changes) -> Result<()> {
    if let Some(backend) = changes.backend {
        config.backend = backend;
    }
    if let Some(custom_cmd) = changes.custom_cmd {
        let custom_cmd = custom_cmd.trim();
        config.custom_cmd = if custom_cmd.is_empty() {
            String::from("pass")
        } else {
            custom_cmd.to_owned()
        };
    }
    if let Some(store_path) = changes.store_path {
        config.store_path = config::expand_store_path(store_path)?;
    }
    if let Some(software_fallback) = changes.software_fallback {
        config.software_fallback = software_fallback;
    }

    config.validate()?;
    config
        .save(config_path)
        .with_context(|| format!("Failed to save {}", config_path.display()))?;
    println!("Settings saved");

    for diagnostic in config.diagnostics() {
        println!("{}{}{}", Fg(Yellow), diagnostic, Fg(Reset));
    }

    Ok(())
}
