//! Terminal emulator discovery for visible launches on Linux
//!
//! Desktop environments do not guarantee a console, so the update handoff
//! opens one explicitly. Emulators are tried in a fixed preference order and
//! the first one present on `PATH` wins.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, info, warn};

use crate::process::Invocation;

/// Emulators taking the command as `-e "<cmd>"`, in preference order
pub const EXECUTE_FLAG_TERMINALS: &[&str] = &[
    "x-terminal-emulator",
    "gnome-terminal",
    "konsole",
    "xfce4-terminal",
    "rxvt",
    "xterm",
];

/// Emulators taking the command as `-c "<cmd>"`, tried after the `-e` family
pub const COMMAND_FLAG_TERMINALS: &[&str] = &["lxterminal"];

/// Flag convention used to pass a command to an emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalFlag {
    /// `-e`
    Execute,
    /// `-c`
    Command,
}

impl TerminalFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalFlag::Execute => "-e",
            TerminalFlag::Command => "-c",
        }
    }
}

/// A terminal emulator and how to hand it a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub name: &'static str,
    pub flag: TerminalFlag,
}

/// An emulator found on `PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTerminal {
    pub terminal: Terminal,
    pub path: PathBuf,
}

impl LocatedTerminal {
    /// Start this terminal directly with `inner` as one argument after the
    /// flag. No shell sits between the emulator and the launch, so `inner`
    /// is only interpreted by the shell the emulator itself runs.
    pub fn invocation(&self, inner: String) -> Invocation {
        Invocation::new(
            self.path.to_string_lossy(),
            vec![self.terminal.flag.as_str().to_string(), inner],
        )
    }
}

/// All known emulators in the order they are tried
pub fn preference_order() -> impl Iterator<Item = Terminal> {
    let execute = EXECUTE_FLAG_TERMINALS.iter().map(|&name| Terminal {
        name,
        flag: TerminalFlag::Execute,
    });
    let command = COMMAND_FLAG_TERMINALS.iter().map(|&name| Terminal {
        name,
        flag: TerminalFlag::Command,
    });
    execute.chain(command)
}

/// First emulator in preference order for which `exists` holds
pub fn select_terminal(mut exists: impl FnMut(&str) -> bool) -> Option<Terminal> {
    preference_order().find(|terminal| exists(terminal.name))
}

/// Probes `PATH` for terminal emulators with `command -v`
#[derive(Debug, Clone, Default)]
pub struct TerminalResolver {
    /// Replacement `PATH` for probes; `None` inherits the process `PATH`
    search_path: Option<OsString>,
}

impl TerminalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Where `command -v <name>` finds `name`, if it does
    pub async fn locate(&self, name: &str) -> Option<PathBuf> {
        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(format!("command -v {}", shell_escape::escape(name.into())))
            .stdin(Stdio::null())
            .stderr(Stdio::null());

        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }

        match cmd.output().await {
            Ok(output) if output.status.success() => {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                debug!(terminal = name, path = %found, "Probed terminal");
                // Builtins and aliases print no path
                if found.is_empty() {
                    Some(PathBuf::from(name))
                } else {
                    Some(PathBuf::from(found))
                }
            }
            Ok(_) => {
                debug!(terminal = name, found = false, "Probed terminal");
                None
            }
            Err(e) => {
                debug!(terminal = name, error = %e, "Terminal probe failed");
                None
            }
        }
    }

    /// First available emulator, or `None` if there is none
    pub async fn resolve(&self) -> Option<LocatedTerminal> {
        for terminal in preference_order() {
            if let Some(path) = self.locate(terminal.name).await {
                info!(terminal = terminal.name, path = %path.display(), "Selected terminal emulator");
                return Some(LocatedTerminal { terminal, path });
            }
        }

        warn!("No terminal emulator found, cannot show the update");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_family_comes_first() {
        let names: Vec<_> = preference_order().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "x-terminal-emulator",
                "gnome-terminal",
                "konsole",
                "xfce4-terminal",
                "rxvt",
                "xterm",
                "lxterminal"
            ]
        );
    }

    #[test]
    fn xterm_beats_lxterminal() {
        let selected = select_terminal(|name| name == "xterm" || name == "lxterminal").unwrap();
        assert_eq!(selected.name, "xterm");
        assert_eq!(selected.flag, TerminalFlag::Execute);
    }

    #[test]
    fn lxterminal_uses_command_flag() {
        let selected = select_terminal(|name| name == "lxterminal").unwrap();
        assert_eq!(selected.flag, TerminalFlag::Command);

        let located = LocatedTerminal {
            terminal: selected,
            path: PathBuf::from("/usr/bin/lxterminal"),
        };
        let invocation = located.invocation("ls".to_string());
        assert_eq!(invocation.program, "/usr/bin/lxterminal");
        assert_eq!(invocation.args, vec!["-c", "ls"]);
        assert!(!invocation.raw_args);
    }

    #[test]
    fn nothing_available() {
        assert!(select_terminal(|_| false).is_none());
    }

    #[test]
    fn dollar_in_updater_path_stays_literal() {
        let located = LocatedTerminal {
            terminal: Terminal {
                name: "xterm",
                flag: TerminalFlag::Execute,
            },
            path: PathBuf::from("/usr/bin/xterm"),
        };
        let inner = "'/opt/my$HOME/FUTO.Updater.Client' update -executable \"Grayjay\"";
        let invocation = located.invocation(inner.to_string());

        assert_eq!(invocation.program, "/usr/bin/xterm");
        assert_eq!(invocation.args, vec!["-e", inner]);
    }

    #[cfg(unix)]
    fn fake_bin(dir: &std::path::Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolves_from_fake_path() {
        let dir = tempfile::tempdir().unwrap();
        fake_bin(dir.path(), "lxterminal");
        fake_bin(dir.path(), "xterm");

        let resolver = TerminalResolver::with_search_path(dir.path());
        let located = resolver.resolve().await.unwrap();
        assert_eq!(located.terminal.name, "xterm");
        assert_eq!(located.path, dir.path().join("xterm"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_path_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TerminalResolver::with_search_path(dir.path());
        assert!(resolver.resolve().await.is_none());
    }
}
