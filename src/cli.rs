use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{self, Backend, BackendConfig};
use crate::consts::VERSION;
use crate::logging;
use crate::subcmds::*;

#[derive(Debug, Parser)]
#[clap(
    name = "passview",
    version = VERSION,
    term_width = 80,
    about = "Browse, search and reveal a pass(1) password store"
)]
struct Opts {
    #[clap(subcommand)]
    cmd: Option<Pass>,
}

#[derive(Debug, Subcommand)]
enum Pass {
    /// List passwords (the default)
    Ls { subfolder: Option<String> },
    /// List passwords whose names contain the query, ignoring case
    Find { query: String },
    /// Show an existing password through the configured backend
    Show {
        #[clap(long, short = 'c')]
        /// Copy the first line to the clipboard instead of printing it
        clip: bool,
        pass_name: String,
    },
    /// Clone a git repository into the password store folder
    Clone {
        url: String,
        #[clap(long, short = 'd')]
        /// Destination folder, defaults to the configured store path
        dest: Option<String>,
    },
    /// Report a missing backend binary or password store
    Check,
    /// Inspect or change the settings
    #[clap(subcommand)]
    Config(ConfigCmd),
    /// Browse the store interactively
    Browse,
}

#[derive(Debug, Subcommand)]
enum ConfigCmd {
    /// Print the current settings as JSON
    Show,
    /// Print the location of the settings file
    Path,
    /// Change and save settings
    Set {
        #[clap(long)]
        /// One of host, podman, docker or custom
        backend: Option<Backend>,
        #[clap(long)]
        /// Command used by the custom backend, e.g. "/opt/pass/bin/pass"
        custom_cmd: Option<String>,
        #[clap(long)]
        /// Password store folder
        store_path: Option<String>,
        #[clap(long)]
        /// Fall back to software rendering in graphical front ends
        software_fallback: Option<bool>,
    },
}

pub fn opt() -> Result<()> {
    let opts = Opts::parse();

    // the browser owns the terminal, so it can't log to stderr
    let _guard = if let Some(Pass::Browse) = opts.cmd {
        logging::init_file()
    } else {
        logging::init_stderr();
        None
    };
    tracing::debug!(?opts, "parsed arguments");

    let config_path = config::config_path()?;
    let config = BackendConfig::load(&config_path);

    match opts.cmd.unwrap_or(Pass::Ls { subfolder: None }) {
        Pass::Ls { subfolder } => ls::ls(&config, subfolder),
        Pass::Find { query } => find::find(&config, query),
        Pass::Show { clip, pass_name } => show::show(&config, clip, pass_name),
        Pass::Clone { url, dest } => clone::clone(config, url, dest),
        Pass::Check => check::check(&config),
        Pass::Config(cmd) => match cmd {
            ConfigCmd::Show => settings::show(&config),
            ConfigCmd::Path => settings::path(&config_path),
            ConfigCmd::Set {
                backend,
                custom_cmd,
                store_path,
                software_fallback,
            } => settings::set(
                config,
                &config_path,
                settings::Changes {
                    backend,
                    custom_cmd,
                    store_path,
                    software_fallback,
                },
            ),
        },
        Pass::Browse => browse::browse(config),
    }
}
