use anyhow::Result;

use crate::config::BackendConfig;
use crate::error::PassviewError;
use crate::search;
use crate::store;

pub fn find(config: &BackendConfig, query: String) -> Result<()> {
    let index = store::scan(&config.store_path)?;
    let matches = search::filter(&index, &query);

    // Just print the matches, one per line, like gopass does.
    if matches.is_empty() {
        return Err(PassviewError::NoMatchesFound(query).into());
    }
    for entry in matches {
        println!("{}", entry.name);
    }

    Ok(())
}
