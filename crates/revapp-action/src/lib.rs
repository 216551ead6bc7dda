//! Review app action orchestration.
//!
//! Wires the source resolver and the review app manager together, runs the
//! requested action for one pull request, and turns the result into step
//! outputs.

pub mod orchestrator;
pub mod supervisor;

pub use orchestrator::{Orchestrator, RunOutcome};
pub use supervisor::{panic_message, run_supervised, RunFailure};
