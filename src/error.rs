use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassviewError {
    #[error("Error: Invalid custom command '{command}': {reason}")]
    InvalidCustomCommand { command: String, reason: &'static str },
    #[error("Error: Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Error: Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },
    #[error("Error: Command exited with status {code}: {stderr}")]
    Process { code: i32, stderr: String },
    #[error("Error: Command was cancelled")]
    Cancelled,
    #[error("Error: Store does not exist at {}", _0.display())]
    StoreDoesntExist(PathBuf),
    #[error("Error: Store at {} is not readable", path.display())]
    StoreUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "Error: Entry '{name}' is provided by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateEntry {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Error: No matches found for search '{0}'")]
    NoMatchesFound(String),
    #[error("Error: {0} is not in the password store")]
    NotInStore(String),
    #[error("Error: Required binary not found: {0}")]
    MissingBinary(String),
    #[error("Error: No clipboard available (neither WAYLAND_DISPLAY nor DISPLAY is set)")]
    ClipFailed,
    #[error("Error: Could not determine the configuration directory")]
    NoConfigDir,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PassviewError>;
