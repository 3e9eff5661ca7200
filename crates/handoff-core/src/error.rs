//! Orchestrator errors

use handoff_api::OrchestratorState;
use handoff_host_api::HostError;
use thiserror::Error;

/// Errors raised by orchestration actions.
///
/// Queries never produce these; they degrade to defaults instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No updater found")]
    UpdaterNotFound,

    #[error("Updater {program} could not be started: {source}")]
    UpdaterNotRunnable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Control was already handed to the updater")]
    AlreadyHandedOff,

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        from: OrchestratorState,
        to: OrchestratorState,
    },

    #[error("Host error: {0}")]
    Host(HostError),
}

impl OrchestratorError {
    /// True for both "no updater binary" and "updater binary not runnable"
    pub fn is_updater_missing(&self) -> bool {
        matches!(
            self,
            OrchestratorError::UpdaterNotFound | OrchestratorError::UpdaterNotRunnable { .. }
        )
    }
}

impl From<HostError> for OrchestratorError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::UnsupportedPlatform(os) => OrchestratorError::UnsupportedPlatform(os),
            HostError::NotRunnable { program, source } => {
                OrchestratorError::UpdaterNotRunnable { program, source }
            }
            other => OrchestratorError::Host(other),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
