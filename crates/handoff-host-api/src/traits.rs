//! Process launcher trait

use async_trait::async_trait;
use thiserror::Error;

use crate::{ExitStatus, LaunchReceipt, LaunchSpec};

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The program could not be started at all (missing, not executable)
    #[error("Failed to start {program}: {source}")]
    NotRunnable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Starts external processes on behalf of the orchestrator
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run the process to completion.
    ///
    /// When `spec.redirect_output` is set, every stdout line is passed to
    /// `on_line` as it is read; the exit status is returned once stdout
    /// reaches end-of-stream and the process has exited.
    async fn run(
        &self,
        spec: &LaunchSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> HostResult<ExitStatus>;

    /// Start the process and return without waiting for it.
    ///
    /// Returns `Ok(None)` when `spec.interactive_terminal` is set and no
    /// terminal emulator is available; nothing is started in that case.
    async fn spawn_detached(&self, spec: &LaunchSpec) -> HostResult<Option<LaunchReceipt>>;
}
