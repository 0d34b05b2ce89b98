use anyhow::Result;

use crate::command::Invocation;
use crate::config::{is_binary_available, BackendConfig};
use crate::error::PassviewError;
use crate::executor::{CancellationToken, Executor, MainLoop, ProcessResult};

pub(crate) mod browse;
pub(crate) mod check;
pub(crate) mod clone;
pub(crate) mod find;
pub(crate) mod ls;
pub(crate) mod settings;
pub(crate) mod show;

/// Runs `invocation` and waits for its completion on this thread. Ctrl-C
/// cancels the child instead of killing us.
pub(crate) fn run_to_completion(invocation: Invocation) -> Result<ProcessResult> {
    let runtime = tokio::runtime::Runtime::new()?;
    let mut main_loop = MainLoop::<Option<ProcessResult>>::new();
    let executor = Executor::new(runtime.handle().clone(), main_loop.dispatcher());
    let token = CancellationToken::new();

    {
        let token = token.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }

    executor.run(invocation, token, |slot, result| *slot = Some(result));

    let mut slot = None;
    loop {
        main_loop.blocking_dispatch_next(&mut slot);
        if let Some(result) = slot.take() {
            return Ok(result);
        }
    }
}

/// Fails when the configured backend's binary can't be found.
pub(crate) fn verify_backend(config: &BackendConfig) -> Result<()> {
    if let Some(binary) = config.backend_binary() {
        if !is_binary_available(&binary) {
            return Err(PassviewError::MissingBinary(binary).into());
        }
    }

    Ok(())
}
