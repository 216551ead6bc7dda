//! Core types, configuration, and error handling for revapp.
//!
//! Shared by the other revapp crates:
//! - [`ReviewAppError`], the error type every crate returns
//! - [`ActionConfig`], resolved from the environment and `.revapp.toml`
//! - [`Logger`], leveled diagnostics with a no-op default
//! - GitHub Actions surface: [`event`] payload parsing and [`workflow`] outputs
//! - Shared types: [`Action`], [`PullRequestContext`], [`SnapshotUrl`]

mod config;
pub mod diagnostics;
mod error;
pub mod event;
mod types;
pub mod workflow;

pub use config::{
    ActionConfig, FileConfig, PlatformConfig, PlatformSection, SourceConfig, SourceSection,
    GITHUB_API_URL, GITHUB_TOKEN, HEROKU_API_TOKEN, HEROKU_API_URL, HEROKU_PIPELINE_ID,
};
pub use diagnostics::{LogLogger, Logger, NoopLogger};
pub use error::ReviewAppError;
pub use types::{Action, PullRequestContext, SnapshotUrl};
pub use workflow::{Outputs, WorkflowLogger};

/// A convenience `Result` type for revapp operations.
pub type Result<T> = std::result::Result<T, ReviewAppError>;
