//! Out-of-line process execution.
//!
//! [`Executor::run`] hands an [`Invocation`] to a tokio runtime and returns
//! immediately. When the child is done, failed to start, or was cancelled, the
//! completion callback is posted to a [`Dispatcher`]; it only runs when the
//! thread owning the matching [`MainLoop`] dispatches it, with exclusive access
//! to that thread's state. Every `run` delivers exactly one callback.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use tokio_util::sync::CancellationToken;

use crate::command::Invocation;
use crate::error::{PassviewError, Result};

/// Exit code reported when the program could not be started at all.
pub const LAUNCH_FAILURE: i32 = -1;
/// Exit code reported when the run was cancelled before it finished.
pub const CANCELLED: i32 = -2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn launch_failure<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        ProcessResult {
            exit_code: LAUNCH_FAILURE,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        ProcessResult {
            exit_code: CANCELLED,
            stdout: String::new(),
            stderr: String::from("cancelled"),
        }
    }

    fn from_output(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        let exit_code = status
            .code()
            .or_else(|| status.signal().map(|signal| 128 + signal))
            .unwrap_or(LAUNCH_FAILURE);

        ProcessResult {
            exit_code,
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Only a zero exit code counts as success.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Standard output on success, the matching error otherwise.
    pub fn into_result(self, program: &str) -> Result<String> {
        match self.exit_code {
            0 => Ok(self.stdout),
            LAUNCH_FAILURE => Err(PassviewError::Launch {
                program: program.to_owned(),
                reason: self.stderr,
            }),
            CANCELLED => Err(PassviewError::Cancelled),
            code => Err(PassviewError::Process {
                code,
                stderr: self.stderr.trim().to_owned(),
            }),
        }
    }
}

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Posts closures to the control thread. Cheap to clone.
pub struct Dispatcher<S> {
    sender: mpsc::UnboundedSender<Job<S>>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Dispatcher {
            sender: self.sender.clone(),
        }
    }
}

impl<S> Dispatcher<S> {
    /// Queues `job`; returns `false` if the main loop is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.sender.send(Box::new(job)).is_ok()
    }
}

/// The receiving end owned by the control thread.
pub struct MainLoop<S> {
    sender: mpsc::UnboundedSender<Job<S>>,
    receiver: mpsc::UnboundedReceiver<Job<S>>,
}

impl<S> Default for MainLoop<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MainLoop<S> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        MainLoop { sender, receiver }
    }

    pub fn dispatcher(&self) -> Dispatcher<S> {
        Dispatcher {
            sender: self.sender.clone(),
        }
    }

    /// Runs every queued job without waiting, returning how many ran.
    pub fn dispatch_pending(&mut self, state: &mut S) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job(state);
            ran += 1;
        }
        ran
    }

    /// Waits for the next job and runs it.
    pub async fn dispatch_next(&mut self, state: &mut S) {
        // We hold a sender ourselves, so the channel never closes.
        if let Some(job) = self.receiver.recv().await {
            job(state);
        }
    }

    /// Blocking variant of [`MainLoop::dispatch_next`] for threads outside the
    /// runtime.
    pub fn blocking_dispatch_next(&mut self, state: &mut S) {
        if let Some(job) = self.receiver.blocking_recv() {
            job(state);
        }
    }
}

pub struct Executor<S> {
    handle: Handle,
    dispatcher: Dispatcher<S>,
}

impl<S: 'static> Executor<S> {
    pub fn new(handle: Handle, dispatcher: Dispatcher<S>) -> Self {
        Executor { handle, dispatcher }
    }

    /// Starts `invocation` and returns at once. `on_done` runs exactly once,
    /// on the main loop's thread.
    pub fn run<F>(&self, invocation: Invocation, token: CancellationToken, on_done: F)
    where
        F: FnOnce(&mut S, ProcessResult) + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();

        self.handle.spawn(async move {
            let result = execute(&invocation, &token).await;
            debug!(
                program = %invocation.program,
                exit_code = result.exit_code,
                "process finished"
            );

            if !dispatcher.dispatch(move |state| on_done(state, result)) {
                warn!(program = %invocation.program, "main loop gone, dropping completion");
            }
        });
    }
}

async fn execute(invocation: &Invocation, token: &CancellationToken) -> ProcessResult {
    if token.is_cancelled() {
        return ProcessResult::cancelled();
    }

    let child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(err) => {
            return ProcessResult::launch_failure(format!(
                "failed to launch {}: {}",
                invocation.program, err
            ))
        }
    };

    // Losing the race drops the child, which kills it.
    tokio::select! {
        output = child.wait_with_output() => match output {
            Ok(output) => ProcessResult::from_output(output.status, &output.stdout, &output.stderr),
            Err(err) => ProcessResult::launch_failure(format!(
                "failed to wait for {}: {}",
                invocation.program, err
            )),
        },
        _ = token.cancelled() => {
            debug!(program = %invocation.program, "cancelled, killing child");
            ProcessResult::cancelled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_is_success() {
        let ok = ProcessResult {
            exit_code: 0,
            stdout: "secret\n".to_owned(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert_eq!(ok.into_result("pass").unwrap(), "secret\n");

        assert!(matches!(
            ProcessResult::launch_failure("nope").into_result("pass"),
            Err(PassviewError::Launch { .. })
        ));
        assert!(matches!(
            ProcessResult::cancelled().into_result("pass"),
            Err(PassviewError::Cancelled)
        ));

        let failed = ProcessResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "Error: x is not in the password store.\n".to_owned(),
        };
        match failed.into_result("pass") {
            Err(PassviewError::Process { code, stderr }) => {
                assert_eq!(code, 1);
                assert_eq!(stderr, "Error: x is not in the password store.");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dispatch_pending_runs_jobs_in_order() {
        let mut main_loop = MainLoop::<Vec<u32>>::new();
        let dispatcher = main_loop.dispatcher();
        dispatcher.dispatch(|state| state.push(1));
        dispatcher.dispatch(|state| state.push(2));

        let mut state = Vec::new();
        assert_eq!(main_loop.dispatch_pending(&mut state), 2);
        assert_eq!(state, [1, 2]);
        assert_eq!(main_loop.dispatch_pending(&mut state), 0);
    }
}
