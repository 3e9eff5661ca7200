//! Process spawning and output capture

use handoff_host_api::{ExitStatus, HostError, HostResult, LaunchSpec};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Concrete program and arguments for a launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Pass `args` to the program untouched (Windows `cmd /C`)
    pub raw_args: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            raw_args: false,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);

        #[cfg(windows)]
        {
            if self.raw_args {
                use std::os::windows::process::CommandExt;
                for arg in &self.args {
                    cmd.raw_arg(arg);
                }
                return cmd;
            }
        }

        cmd.args(&self.args);
        cmd
    }

    fn not_runnable(&self, source: std::io::Error) -> HostError {
        HostError::NotRunnable {
            program: self.program.clone(),
            source,
        }
    }
}

/// Fail unless `executable` is a file this process could start.
///
/// A shell or terminal wrapping the executable starts even when the
/// executable itself cannot, so detached launches check it up front. Bare
/// program names are left to `PATH` lookup.
pub fn ensure_runnable(executable: &Path) -> HostResult<()> {
    let not_runnable = |source: io::Error| HostError::NotRunnable {
        program: executable.display().to_string(),
        source,
    };

    if !executable.is_absolute() && executable.components().count() < 2 {
        return Ok(());
    }

    let metadata = std::fs::metadata(executable).map_err(not_runnable)?;
    if !metadata.is_file() {
        return Err(not_runnable(io::Error::other("not a regular file")));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(not_runnable(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "no execute permission",
            )));
        }
    }

    Ok(())
}

/// Render a launch as one shell command line: escaped executable, verb, then
/// the arguments verbatim.
pub fn render_command_line(spec: &LaunchSpec) -> String {
    let executable = spec.executable.to_string_lossy();
    let mut parts = vec![shell_escape::escape(executable).into_owned()];
    parts.extend(spec.argv());
    parts.join(" ")
}

/// Run `command_line` through the platform shell
pub fn shell_invocation(command_line: String) -> Invocation {
    if cfg!(windows) {
        Invocation {
            program: "cmd".into(),
            args: vec!["/C".into(), command_line],
            raw_args: true,
        }
    } else {
        Invocation::new("/bin/sh", vec!["-c".into(), command_line])
    }
}

/// How a launch is started, ignoring terminal emulators
pub fn invocation_for(spec: &LaunchSpec) -> Invocation {
    if spec.use_shell {
        shell_invocation(render_command_line(spec))
    } else {
        Invocation::new(spec.executable.to_string_lossy(), spec.argv())
    }
}

/// Run to completion, streaming stdout lines to `on_line` when
/// `redirect_output` is set.
///
/// Lines are decoded lossily so a stray non-UTF-8 byte does not abort the
/// read.
pub async fn run_to_exit(
    invocation: &Invocation,
    redirect_output: bool,
    on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
) -> HostResult<ExitStatus> {
    let mut cmd = tokio::process::Command::from(invocation.command());
    if redirect_output {
        cmd.stdout(Stdio::piped());
    }

    let mut child = cmd.spawn().map_err(|e| invocation.not_runnable(e))?;
    debug!(pid = ?child.id(), program = %invocation.program, "Process spawned");

    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            debug!(program = %invocation.program, "{}", line);
            on_line(line);
        }
    }

    let status = child.wait().await?;
    Ok(status.into())
}

/// Start a process without waiting for it.
///
/// On Unix the child gets its own session so it survives the parent's exit;
/// on Windows it gets its own console.
pub fn start_detached(invocation: &Invocation) -> HostResult<u32> {
    let mut cmd = invocation.command();
    cmd.stdin(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(std::io::Error::from)?;
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
        cmd.creation_flags(CREATE_NEW_CONSOLE);
    }

    let child = cmd.spawn().map_err(|e| invocation.not_runnable(e))?;
    let pid = child.id();

    debug!(pid = pid, program = %invocation.program, "Detached process spawned");

    Ok(pid)
}
