use async_trait::async_trait;
use revapp_core::Result;

use crate::types::{App, NewReviewApp, ReviewApp};

/// Deployment platform operations the review app manager relies on.
///
/// Implementations handle transport, authentication, and pagination; every
/// call goes to the platform, nothing is cached.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// `POST /review-apps`
    async fn create_review_app(&self, body: &NewReviewApp) -> Result<ReviewApp>;

    /// `GET /review-apps/{id}`
    async fn get_review_app(&self, id: &str) -> Result<ReviewApp>;

    /// `GET /pipelines/{pipeline}/review-apps`, all pages, in platform order.
    async fn list_review_apps(&self, pipeline: &str) -> Result<Vec<ReviewApp>>;

    /// `DELETE /review-apps/{id}`
    async fn delete_review_app(&self, id: &str) -> Result<ReviewApp>;

    /// `GET /apps/{id}`
    async fn get_app(&self, id: &str) -> Result<App>;
}
