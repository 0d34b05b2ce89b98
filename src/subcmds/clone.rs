use std::fs;

use anyhow::{Context, Result};

use crate::command::HostEnv;
use crate::config::{self, is_binary_available, BackendConfig};
use crate::consts::PASSVIEW_GIT_BINARY;
use crate::error::PassviewError;
use crate::session::Session;

use super::run_to_completion;

pub fn clone(mut config: BackendConfig, url: String, dest: Option<String>) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("Error: Enter a Git URL");
    }
    if let Some(dest) = dest {
        config.store_path = config::expand_store_path(dest)?;
    }
    if !is_binary_available(&PASSVIEW_GIT_BINARY) {
        return Err(PassviewError::MissingBinary(PASSVIEW_GIT_BINARY.as_str().to_owned()).into());
    }

    fs::create_dir_all(&config.store_path)?;
    let mut session = Session::new(config, HostEnv::detect());
    let invocation = session.clone_invocation(url);
    let program = invocation.program.clone();

    eprintln!("Cloning {} into {}…", url, session.config().store_path.display());
    run_to_completion(invocation)?
        .into_result(&program)
        .with_context(|| "git clone failed")?;

    let count = session.refresh()?;
    println!("Repository cloned: {} entries", count);

    Ok(())
}
