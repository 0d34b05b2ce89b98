//! Turning a backend configuration plus logical `pass` arguments into the
//! concrete program and argument vector that gets executed.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{Backend, BackendConfig};
use crate::consts::{
    CONTAINER_GNUPG_DIR, CONTAINER_HOME, CONTAINER_IMAGE, CONTAINER_PASS_PROGRAM,
    CONTAINER_STORE_DIR, GNUPG_DIR, PASSVIEW_GIT_BINARY, PASS_PROGRAM, RELABEL_MARKER,
};
use crate::error::{PassviewError, Result};

/// A program and its arguments, ready to be launched without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<S, I, A>(program: S, args: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Invocation {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let quoted = std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| match shlex::try_quote(word) {
                Ok(quoted) => quoted.into_owned(),
                Err(_) => word.clone(),
            })
            .collect::<Vec<_>>();

        f.write_str(&quoted.join(" "))
    }
}

/// Host facts needed by the container strategies, gathered up front so that
/// [`build`] does no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnv {
    pub uid: u32,
    pub gid: u32,
    /// The GnuPG home to mount, if it exists on the host.
    pub gnupg_dir: Option<PathBuf>,
}

impl HostEnv {
    pub fn detect() -> Self {
        // SAFETY: getuid(2) and getgid(2) always succeed and touch no memory.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        let gnupg_dir = if GNUPG_DIR.is_dir() {
            Some(GNUPG_DIR.clone())
        } else {
            None
        };

        HostEnv {
            uid,
            gid,
            gnupg_dir,
        }
    }
}

/// Builds the invocation running `pass <args>` through the configured backend.
///
/// Fails only when the custom command cannot be tokenized.
pub fn build<S>(config: &BackendConfig, host: &HostEnv, args: &[S]) -> Result<Invocation>
where
    S: AsRef<str>,
{
    let args = args.iter().map(|arg| arg.as_ref().to_owned());

    let invocation = match config.backend {
        Backend::Host => Invocation::new(PASS_PROGRAM, args),
        Backend::Custom => {
            let mut tokens = split_custom_command(&config.custom_cmd)?.into_iter();
            // split_custom_command never returns an empty vector
            let program = tokens.next().unwrap_or_default();
            Invocation::new(program, tokens.chain(args))
        }
        Backend::Podman => container(Backend::Podman, &config.store_path, host, args),
        Backend::Docker => container(Backend::Docker, &config.store_path, host, args),
    };
    tracing::debug!(backend = %config.backend, %invocation, "built invocation");

    Ok(invocation)
}

/// Shell-style word splitting of the configured custom command. Quotes are
/// honoured; nothing is expanded.
pub fn split_custom_command(command: &str) -> Result<Vec<String>> {
    let tokens = shlex::split(command).ok_or_else(|| PassviewError::InvalidCustomCommand {
        command: command.to_owned(),
        reason: "unbalanced quoting",
    })?;

    if tokens.is_empty() {
        return Err(PassviewError::InvalidCustomCommand {
            command: command.to_owned(),
            reason: "no program given",
        });
    }

    Ok(tokens)
}

fn container<I>(engine: Backend, store: &Path, host: &HostEnv, args: I) -> Invocation
where
    I: Iterator<Item = String>,
{
    let marker = if engine == Backend::Podman {
        RELABEL_MARKER
    } else {
        ""
    };
    let mount = |host_dir: &Path, container_dir: &str| {
        vec![
            "-v".to_owned(),
            format!("{}:{}{}", host_dir.display(), container_dir, marker),
        ]
    };

    let mut argv = vec![
        "run".to_owned(),
        "--rm".to_owned(),
        "--user".to_owned(),
        format!("{}:{}", host.uid, host.gid),
        "-e".to_owned(),
        format!("HOME={}", CONTAINER_HOME),
        "-w".to_owned(),
        CONTAINER_HOME.to_owned(),
    ];
    argv.extend(mount(store, CONTAINER_STORE_DIR));
    if let Some(gnupg) = &host.gnupg_dir {
        argv.extend(mount(gnupg, CONTAINER_GNUPG_DIR));
    }
    argv.push(CONTAINER_IMAGE.to_owned());
    argv.push(CONTAINER_PASS_PROGRAM.to_owned());
    argv.extend(args);

    Invocation::new(engine.as_str(), argv)
}

/// `git clone <url> <dest>`, run directly rather than through a backend.
pub fn clone_invocation<S, P>(url: S, dest: P) -> Invocation
where
    S: AsRef<str>,
    P: AsRef<Path>,
{
    Invocation::new(
        PASSVIEW_GIT_BINARY.as_str(),
        vec![
            "clone".to_owned(),
            url.as_ref().to_owned(),
            dest.as_ref().display().to_string(),
        ],
    )
}
