//! Spawn plumbing for exeq.
//!
//! This module turns an [Action] plus [SpawnOptions] into a ready
//! [std::process::Command] and provides the two spawn primitives: the
//! blocking-capable default and the detached variant used by the fork flag.
//!
//! Output capture goes through an anonymous pipe so stderr can share
//! stdout's write end, which is what the pager flag needs. The read end is
//! handed back to the caller and later becomes the pager's stdin.

use crate::core::context::Action;

use std::env;
use std::io::{self, PipeReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Where one of the child's standard streams should go.
///
/// `Stdout` is only meaningful for stderr: it shares stdout's pipe, so both
/// streams arrive interleaved at the same read end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamSpec {
    #[default]
    Inherit,
    Piped,
    Null,
    Stdout,
}

/// Keyword options for the spawn call.
///
/// `shell` left at `None` means "derive from the action kind": a command
/// line needs a shell, argv tokens do not. The shell itself is read from
/// `$SHELL` at spawn time, never cached.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub shell: Option<bool>,
    pub cwd: Option<PathBuf>,
    pub stdin: StreamSpec,
    pub stdout: StreamSpec,
    pub stderr: StreamSpec,
}

/// Build the command for an action.
///
/// Returns the command and, when stdout is piped, the read end of the
/// capture pipe. `stdin_pipe` overrides the stdin spec; it carries a prior
/// child's output into this one.
///
/// With `detached` set all streams are bound to the null device (except a
/// provided `stdin_pipe`), so the child cannot touch the terminal after the
/// caller moves on.
pub(crate) fn prepare(
    action: &Action,
    options: &SpawnOptions,
    detached: bool,
    stdin_pipe: Option<PipeReader>,
) -> io::Result<(Command, Option<PipeReader>)> {
    let shell = options.shell.unwrap_or_else(|| action.is_shell());

    let mut cmd = if shell {
        let sh = env::var("SHELL")
            .map_err(|_| io::Error::other("SHELL is not set, cannot run a shell command"))?;
        let mut cmd = Command::new(sh);
        cmd.arg("-c").arg(action.to_string());
        cmd
    } else {
        match action {
            Action::Args(argv) => {
                let Some((program, rest)) = argv.split_first() else {
                    return Err(io::Error::other("empty command"));
                };
                let mut cmd = Command::new(program);
                cmd.args(rest);
                cmd
            }
            // shell explicitly disabled: the whole line is the program name
            Action::Shell(line) => Command::new(line),
        }
    };

    if let Some(dir) = &options.cwd {
        cmd.current_dir(dir);
    }

    if detached {
        match stdin_pipe {
            Some(pipe) => {
                cmd.stdin(Stdio::from(pipe));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        return Ok((cmd, None));
    }

    let mut capture = None;
    match options.stdout {
        StreamSpec::Inherit | StreamSpec::Stdout => {}
        StreamSpec::Null => {
            cmd.stdout(Stdio::null());
        }
        StreamSpec::Piped => {
            let (reader, writer) = io::pipe()?;
            if options.stderr == StreamSpec::Stdout {
                cmd.stderr(Stdio::from(writer.try_clone()?));
            }
            cmd.stdout(Stdio::from(writer));
            capture = Some(reader);
        }
    }

    match options.stderr {
        StreamSpec::Inherit => {}
        StreamSpec::Null => {
            cmd.stderr(Stdio::null());
        }
        StreamSpec::Piped => {
            cmd.stderr(Stdio::piped());
        }
        // Without a capture pipe there is nothing to share; the stream
        // stays on the parent's stdout.
        StreamSpec::Stdout => {
            if capture.is_none() {
                cmd.stderr(Stdio::inherit());
            }
        }
    }

    match stdin_pipe {
        Some(pipe) => {
            cmd.stdin(Stdio::from(pipe));
        }
        None => match options.stdin {
            StreamSpec::Inherit | StreamSpec::Stdout => {}
            StreamSpec::Null => {
                cmd.stdin(Stdio::null());
            }
            StreamSpec::Piped => {
                cmd.stdin(Stdio::piped());
            }
        },
    }

    Ok((cmd, capture))
}

/// Spawn a child in its own process group, without waiting on it.
///
/// The handle is still returned so the caller can track the child. On
/// platforms without process groups this fails with `Unsupported`, which the
/// runner treats like any other precondition failure.
pub(crate) fn spawn_detached(cmd: &mut Command) -> io::Result<Child> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
        cmd.spawn()
    }
    #[cfg(not(unix))]
    {
        let _ = cmd;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "forked spawn is not supported on this platform",
        ))
    }
}
