//! Orchestrator states

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Verb;

/// Where the update orchestrator is in its lifecycle
///
/// ```text
/// Idle -> CheckingAvailability -> {UpToDate | UpdateAvailable} -> Updating -> HandedOff
/// Idle -> SelfUpdating -> Idle
/// Idle -> TestingReboot -> HandedOff
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrchestratorState {
    Idle,
    CheckingAvailability,
    UpToDate,
    UpdateAvailable,
    Updating,
    /// The updater replaces itself while the application keeps running.
    /// Unlike the other actions this never reaches `HandedOff`; it always
    /// returns to `Idle` once the updater exits.
    SelfUpdating,
    TestingReboot,
    /// Control was passed to the updater with the given verb
    HandedOff { verb: Verb },
}

impl OrchestratorState {
    /// States from which a new operation may start
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrchestratorState::Idle
                | OrchestratorState::UpToDate
                | OrchestratorState::UpdateAvailable
        )
    }

    /// The application has relinquished control and is expected to exit
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorState::HandedOff { .. })
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: OrchestratorState) -> bool {
        use OrchestratorState::*;

        match (self, next) {
            (HandedOff { .. }, _) => false,
            (s, CheckingAvailability | Updating | SelfUpdating | TestingReboot) => s.is_settled(),
            (CheckingAvailability, UpToDate | UpdateAvailable) => true,
            (Updating, HandedOff { verb: Verb::Update }) => true,
            (TestingReboot, HandedOff { verb: Verb::Reboot }) => true,
            // A self-update blocks until the updater exits, then control returns
            (SelfUpdating, Idle) => true,
            // An operation that failed or could not hand off settles back
            (CheckingAvailability | Updating | TestingReboot, Idle | UpToDate | UpdateAvailable) => {
                true
            }
            _ => false,
        }
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorState::Idle => f.write_str("idle"),
            OrchestratorState::CheckingAvailability => f.write_str("checking_availability"),
            OrchestratorState::UpToDate => f.write_str("up_to_date"),
            OrchestratorState::UpdateAvailable => f.write_str("update_available"),
            OrchestratorState::Updating => f.write_str("updating"),
            OrchestratorState::SelfUpdating => f.write_str("self_updating"),
            OrchestratorState::TestingReboot => f.write_str("testing_reboot"),
            OrchestratorState::HandedOff { verb } => write!(f, "handed_off({verb})"),
        }
    }
}
