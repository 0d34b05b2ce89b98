pub mod cli;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod consts;
pub mod error;
pub mod event;
pub mod executor;
pub mod logging;
pub mod search;
pub mod session;
pub mod store;
pub(crate) mod subcmds;
pub mod tree;
pub mod ui;

pub use error::{PassviewError, Result};
