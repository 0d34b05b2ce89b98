//! Typed view of the persisted backend settings.
//!
//! The settings live in a small JSON file. Loading never fails hard: a missing
//! file, unknown fields or a malformed document all fall back to defaults so
//! the application stays usable, and saving is only done on explicit request.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, HOME, PASSVIEW_CONFIG, PASSWORD_STORE_DIR, PASS_PROGRAM,
};
use crate::error::{PassviewError, Result};

/// How `pass` gets executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `pass` from the host's `PATH`.
    Host,
    /// Container engine with SELinux mount relabeling.
    Podman,
    /// Container engine without relabeling.
    Docker,
    /// A user supplied command prefix.
    Custom,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Host, Backend::Podman, Backend::Docker, Backend::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Host => "host",
            Backend::Podman => "podman",
            Backend::Docker => "docker",
            Backend::Custom => "custom",
        }
    }

    /// Picks the first backend whose binary is reachable, in the order
    /// host, podman, docker; `Custom` when none is.
    pub fn detect() -> Backend {
        if is_binary_available(PASS_PROGRAM) {
            Backend::Host
        } else if is_binary_available("podman") {
            Backend::Podman
        } else if is_binary_available("docker") {
            Backend::Docker
        } else {
            Backend::Custom
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = PassviewError;

    fn from_str(s: &str) -> Result<Self> {
        Backend::ALL
            .iter()
            .copied()
            .find(|backend| backend.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                PassviewError::InvalidConfig(format!(
                    "unknown backend '{}' (expected host, podman, docker or custom)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "Backend::detect")]
    pub backend: Backend,
    #[serde(default = "default_custom_cmd")]
    pub custom_cmd: String,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_software_fallback")]
    pub software_fallback: bool,
}

fn default_custom_cmd() -> String {
    PASS_PROGRAM.to_owned()
}

fn default_store_path() -> PathBuf {
    PASSWORD_STORE_DIR.clone()
}

fn default_software_fallback() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            backend: Backend::detect(),
            custom_cmd: default_custom_cmd(),
            store_path: default_store_path(),
            software_fallback: default_software_fallback(),
        }
    }
}

/// A user-actionable problem with the current environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MissingBinary(String),
    MissingStore(PathBuf),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::MissingBinary(binary) => write!(
                f,
                "Missing: {}. Configure a different backend or set a custom command.",
                binary
            ),
            Diagnostic::MissingStore(path) => {
                write!(f, "Password store not found at {}.", path.display())
            }
        }
    }
}

impl BackendConfig {
    /// Reads the configuration at `path`, falling back to defaults.
    pub fn load<P>(path: P) -> BackendConfig
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), %err, "no readable config, using defaults");
                return BackendConfig::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "malformed config, using defaults");
                BackendConfig::default()
            }
        }
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.store_path.is_absolute() {
            return Err(PassviewError::InvalidConfig(format!(
                "store path {} is not absolute",
                self.store_path.display()
            )));
        }

        if self.backend == Backend::Custom {
            crate::command::split_custom_command(&self.custom_cmd)?;
        }

        Ok(())
    }

    /// The binary the configured backend launches first.
    pub fn backend_binary(&self) -> Option<String> {
        match self.backend {
            Backend::Host => Some(PASS_PROGRAM.to_owned()),
            Backend::Podman => Some("podman".to_owned()),
            Backend::Docker => Some("docker".to_owned()),
            Backend::Custom => crate::command::split_custom_command(&self.custom_cmd)
                .ok()
                .and_then(|tokens| tokens.into_iter().next()),
        }
    }

    /// Checks for a missing backend binary and a missing store directory.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(binary) = self.backend_binary() {
            if !is_binary_available(&binary) {
                diagnostics.push(Diagnostic::MissingBinary(binary));
            }
        }
        if !self.store_path.is_dir() {
            diagnostics.push(Diagnostic::MissingStore(self.store_path.clone()));
        }

        diagnostics
    }
}

/// Location of the config file: `PASSVIEW_CONFIG`, or
/// `<config dir>/passview/config.json`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = &*PASSVIEW_CONFIG {
        return Ok(path.clone());
    }

    let dirs = BaseDirs::new().ok_or(PassviewError::NoConfigDir)?;
    Ok(dirs
        .config_dir()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

/// Expands a leading `~` and resolves relative paths against the current
/// directory.
pub fn expand_store_path<S>(path: S) -> Result<PathBuf>
where
    S: AsRef<str>,
{
    let path = path.as_ref().trim();
    if path.is_empty() {
        return Ok(default_store_path());
    }

    let path = if path == "~" {
        PathBuf::from(&*HOME)
    } else if let Some(rest) = path.strip_prefix("~/") {
        PathBuf::from(&*HOME).join(rest)
    } else {
        PathBuf::from(path)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Whether `binary` is an executable file, either as given (when it contains a
/// directory component) or somewhere on `PATH`.
pub fn is_binary_available(binary: &str) -> bool {
    let candidate = Path::new(binary);
    if candidate
        .parent()
        .map(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(false)
    {
        return is_executable_file(candidate);
    }

    let path_var = match env::var_os("PATH") {
        Some(path_var) => path_var,
        None => return false,
    };
    env::split_paths(&path_var).any(|directory| is_executable_file(&directory.join(binary)))
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Podman".parse::<Backend>().unwrap(), Backend::Podman);
        assert_eq!(" docker ".parse::<Backend>().unwrap(), Backend::Docker);
        assert!("flatpak".parse::<Backend>().is_err());
    }

    #[test]
    fn backend_serializes_lowercase() {
        let json = serde_json::to_string(&Backend::Custom).unwrap();
        assert_eq!(json, "\"custom\"");
    }

    #[test]
    fn relative_store_path_is_invalid() {
        let config = BackendConfig {
            backend: Backend::Host,
            custom_cmd: "pass".to_owned(),
            store_path: PathBuf::from("relative/store"),
            software_fallback: true,
        };

        assert!(matches!(
            config.validate(),
            Err(PassviewError::InvalidConfig(_))
        ));
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_store_path("~/store").unwrap();
        assert_eq!(expanded, PathBuf::from(&*HOME).join("store"));
    }

    #[test]
    fn absolute_binary_path_is_checked_directly() {
        assert!(is_binary_available("/bin/sh"));
        assert!(!is_binary_available("/definitely/not/here/pass"));
    }
}
