use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::consts::PASSWORD_STORE_X_SELECTION;
use crate::error::{PassviewError, Result};

/// Copies `contents` with wl-copy on Wayland or xclip on X11.
pub fn clip<S>(contents: S) -> Result<()>
where
    S: AsRef<[u8]>,
{
    let contents = contents.as_ref();
    let mut command = if env::var("WAYLAND_DISPLAY").is_ok() {
        let mut command = Command::new("wl-copy");
        command.arg("--trim-newline");
        command
    } else if env::var("DISPLAY").is_ok() {
        let mut command = Command::new("xclip");
        command.args(&["-in", "-selection", PASSWORD_STORE_X_SELECTION.as_str()]);
        command
    } else {
        return Err(PassviewError::ClipFailed);
    };

    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|err| PassviewError::Launch {
            program,
            reason: err.to_string(),
        })?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(contents)?;
    }
    // xclip forks and keeps serving the selection; wait for the foreground part
    child.wait()?;

    Ok(())
}

/// The first line of an entry, which `pass` treats as the password.
pub fn first_line(contents: &str) -> &str {
    contents.lines().next().unwrap_or("")
}
