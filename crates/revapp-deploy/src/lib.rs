//! Review app lifecycle on the deployment platform.
//!
//! Provides the [`PlatformApi`] seam, the Heroku implementation, and the
//! [`ReviewAppManager`] that owns the create/lookup/destroy sequence.

pub mod heroku;
pub mod manager;
pub mod platform;
mod types;

pub use heroku::HerokuClient;
pub use manager::ReviewAppManager;
pub use platform::PlatformApi;
pub use types::{
    App, AppRef, CreatedReviewApp, DestroyOutcome, NewReviewApp, ReviewApp, ReviewAppRequest,
    SourceBlob,
};
