//! Launch descriptions

use handoff_api::Verb;
use std::path::{Path, PathBuf};

/// One external-process invocation, built fresh for every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,

    /// Updater verb, `None` for helper programs such as `chmod`
    pub verb: Option<Verb>,

    /// Arguments after the verb. With `use_shell` these are shell-level
    /// tokens and may carry their own quoting.
    pub arguments: Vec<String>,

    /// Run inside a visible terminal emulator (Linux handoff)
    pub interactive_terminal: bool,

    /// Capture stdout line by line
    pub redirect_output: bool,

    /// Interpret the command line through the platform shell
    pub use_shell: bool,
}

impl LaunchSpec {
    /// Invoke the updater binary with a verb
    pub fn updater(executable: impl Into<PathBuf>, verb: Verb) -> Self {
        Self {
            executable: executable.into(),
            verb: Some(verb),
            arguments: Vec::new(),
            interactive_terminal: false,
            redirect_output: false,
            use_shell: false,
        }
    }

    /// Invoke an arbitrary program
    pub fn program(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            verb: None,
            arguments: Vec::new(),
            interactive_terminal: false,
            redirect_output: false,
            use_shell: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn capture_output(mut self) -> Self {
        self.redirect_output = true;
        self
    }

    pub fn through_shell(mut self) -> Self {
        self.use_shell = true;
        self
    }

    pub fn in_terminal(mut self) -> Self {
        self.interactive_terminal = true;
        self
    }

    /// Verb followed by arguments
    pub fn argv(&self) -> Vec<String> {
        self.verb
            .map(|v| v.as_str().to_string())
            .into_iter()
            .chain(self.arguments.iter().cloned())
            .collect()
    }

    /// Short name for logs and mock lookups: the verb, else the program name
    pub fn label(&self) -> String {
        match self.verb {
            Some(verb) => verb.as_str().to_string(),
            None => program_name(&self.executable),
        }
    }
}

fn program_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Wrap a value in double quotes, escaping embedded double quotes.
pub fn quote_argument(value: &str) -> String {
    format!("\"{}\"", escape_double_quotes(value))
}

/// Escape embedded double quotes as `\"`.
pub fn escape_double_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}
