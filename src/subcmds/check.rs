use anyhow::Result;
use termion::color::{Fg, Reset, Yellow};

use crate::config::BackendConfig;

pub fn check(config: &BackendConfig) -> Result<()> {
    let diagnostics = config.diagnostics();

    if diagnostics.is_empty() {
        println!(
            "Backend {} is available and the store exists at {}.",
            config.backend,
            config.store_path.display()
        );
        return Ok(());
    }

    for diagnostic in &diagnostics {
        println!("{}{}{}", Fg(Yellow), diagnostic, Fg(Reset));
    }
    anyhow::bail!("Error: {} problem(s) found", diagnostics.len())
}
