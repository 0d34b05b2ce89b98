//! Runtime constants
//!
//! # consts
//!
//! This module houses constants used throughout the code. Many of these are
//! just lazily-evaluated environment variables.

use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;

pub const VERSION: &str = env!("PASSVIEW_VERSION");

/// Suffix of every encrypted entry file in a store.
pub const ENTRY_SUFFIX: &str = ".gpg";
pub const PASS_PROGRAM: &str = "pass";

// Container strategies
pub const CONTAINER_IMAGE: &str = "ghcr.io/noobping/pass:latest";
pub const CONTAINER_PASS_PROGRAM: &str = "pass";
pub const CONTAINER_HOME: &str = "/home/app";
pub const CONTAINER_STORE_DIR: &str = "/home/app/.password-store";
pub const CONTAINER_GNUPG_DIR: &str = "/home/app/.gnupg";
/// SELinux relabel marker appended to podman bind mounts.
pub const RELABEL_MARKER: &str = ":Z";

pub const CONFIG_DIR_NAME: &str = "passview";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "passview.log";

pub static HOME: Lazy<String> = Lazy::new(|| env::var("HOME").unwrap_or_default());
pub static GNUPG_DIR: Lazy<PathBuf> = Lazy::new(|| match env::var("GNUPGHOME") {
    Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
    _ => PathBuf::from(&*HOME).join(".gnupg"),
});
pub static PASSVIEW_CONFIG: Lazy<Option<PathBuf>> = Lazy::new(|| {
    env::var("PASSVIEW_CONFIG")
        .ok()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
});
pub static PASSVIEW_GIT_BINARY: Lazy<String> =
    Lazy::new(|| env::var("PASSVIEW_GIT_BINARY").unwrap_or_else(|_| String::from("git")));
pub static PASSVIEW_LOG: Lazy<String> =
    Lazy::new(|| env::var("PASSVIEW_LOG").unwrap_or_else(|_| String::from("warn")));

// pass(1)
pub static PASSWORD_STORE_DIR: Lazy<PathBuf> = Lazy::new(|| match env::var("PASSWORD_STORE_DIR") {
    Ok(store) if !store.is_empty() => PathBuf::from(store),
    _ => PathBuf::from(&*HOME).join(".password-store"),
});
pub static PASSWORD_STORE_X_SELECTION: Lazy<String> =
    Lazy::new(|| match env::var("PASSWORD_STORE_X_SELECTION") {
        Ok(sel) => match sel.as_ref() {
            "p" | "primary" => "primary".to_owned(),
            "sec" | "secondary" => "secondary".to_owned(),
            _ => "clipboard".to_owned(),
        },
        Err(_) => "clipboard".to_owned(),
    });
