use std::any::Any;
use std::sync::Arc;

use revapp_core::{Action, PullRequestContext, ReviewAppError};

use crate::orchestrator::{Orchestrator, RunOutcome};

/// Why a supervised run failed.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RunFailure {
    /// The run returned an error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Error(#[from] ReviewAppError),

    /// The run panicked; holds the normalized panic message.
    #[error("{0}")]
    #[diagnostic(code(revapp::panic))]
    Panicked(String),
}

/// Turn a panic payload into a failure message.
///
/// # Examples
///
/// ```
/// use revapp_action::panic_message;
///
/// assert_eq!(panic_message(Box::new("boom")), "boom");
/// assert_eq!(panic_message(Box::new(String::from("boom"))), "boom");
/// assert_eq!(panic_message(Box::new(17_u8)), "Unknown fatal error");
/// ```
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "Unknown fatal error".to_string(),
        },
    }
}

/// Run the orchestrator on its own task so a panic surfaces as a
/// [`RunFailure::Panicked`] instead of tearing down the caller.
///
/// # Errors
///
/// Returns [`RunFailure::Error`] for errors from the run and
/// [`RunFailure::Panicked`] if it panicked or was cancelled.
pub async fn run_supervised(
    orchestrator: Arc<Orchestrator>,
    action: Action,
    pr: PullRequestContext,
) -> Result<RunOutcome, RunFailure> {
    let handle = tokio::spawn(async move { orchestrator.run(&action, &pr).await });

    match handle.await {
        Ok(result) => Ok(result?),
        Err(join_error) if join_error.is_panic() => {
            Err(RunFailure::Panicked(panic_message(join_error.into_panic())))
        }
        Err(join_error) => Err(RunFailure::Panicked(join_error.to_string())),
    }
}
