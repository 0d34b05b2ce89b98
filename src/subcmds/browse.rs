use anyhow::Result;

use crate::command::HostEnv;
use crate::config::BackendConfig;
use crate::session::Session;
use crate::ui;

pub fn browse(config: BackendConfig) -> Result<()> {
    let session = Session::new(config, HostEnv::detect());
    ui::run(session)
}
