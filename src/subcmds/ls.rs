use anyhow::Result;

use crate::config::BackendConfig;
use crate::error::PassviewError;
use crate::store;
use crate::tree;

pub fn ls(config: &BackendConfig, subfolder: Option<String>) -> Result<()> {
    let index = store::scan(&config.store_path)?;
    let prefix = subfolder
        .as_deref()
        .unwrap_or("")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    let tree = tree::tree(&index, &prefix[..]);
    if tree.tree.is_empty() && !prefix.is_empty() {
        return Err(PassviewError::NotInStore(prefix.join("/")).into());
    }

    print!("{}", tree);

    Ok(())
}
