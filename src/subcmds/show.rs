use anyhow::{Context, Result};

use crate::clipboard;
use crate::command::{self, HostEnv};
use crate::config::BackendConfig;
use crate::consts::ENTRY_SUFFIX;
use crate::error::PassviewError;
use crate::store;

use super::{run_to_completion, verify_backend};

pub fn show(config: &BackendConfig, clip: bool, pass_name: String) -> Result<()> {
    let name = pass_name.trim_matches('/');
    let name = name.strip_suffix(ENTRY_SUFFIX).unwrap_or(name);

    verify_backend(config)?;
    let index = store::scan(&config.store_path)?;
    if index.get(name).is_none() {
        return Err(PassviewError::NotInStore(name.to_owned()).into());
    }

    let invocation = command::build(config, &HostEnv::detect(), &["show", name])?;
    let program = invocation.program.clone();
    let contents = run_to_completion(invocation)?
        .into_result(&program)
        .with_context(|| format!("Failed to open {}", name))?;

    if clip {
        clipboard::clip(clipboard::first_line(&contents))?;
        println!("Copied {} to clipboard.", name);
    } else {
        print!("{}", contents);
    }

    Ok(())
}
