//! Version negotiation and update orchestration for handoff
//!
//! This crate is the heart of handoff, containing:
//! - Version negotiation (installed updater, target app, target updater, changelog)
//! - The update-availability check and its exit-code protocol
//! - The orchestrator state machine (Idle -> CheckingAvailability -> ... -> HandedOff)
//! - The startup-argument context forwarded across a reboot handoff

mod error;
mod negotiator;
mod orchestrator;
mod remote;
mod startup;

pub use error::*;
pub use negotiator::*;
pub use orchestrator::*;
pub use remote::*;
pub use startup::*;
