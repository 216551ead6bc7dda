use std::sync::Arc;

use revapp_core::{diagnostics, Logger, Result};

use crate::platform::PlatformApi;
use crate::types::{CreatedReviewApp, DestroyOutcome, NewReviewApp, ReviewAppRequest};

/// Creates and destroys the review apps of one pipeline.
///
/// Review apps are correlated with pull requests only through their
/// `pr_number`. At most one review app per pull request is assumed; when
/// several exist, [`destroy_review_app`](Self::destroy_review_app) removes
/// the first one in platform list order and leaves the rest.
pub struct ReviewAppManager {
    api: Arc<dyn PlatformApi>,
    logger: Arc<dyn Logger>,
    pipeline: String,
}

impl ReviewAppManager {
    pub fn new(api: Arc<dyn PlatformApi>, pipeline: impl Into<String>) -> Self {
        Self {
            api,
            logger: diagnostics::noop(),
            pipeline: pipeline.into(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Create a review app, then fetch it again to learn its application id.
    ///
    /// The creation response does not carry the application id; the platform
    /// fills it in shortly afterwards. If the follow-up fetch happens first,
    /// `app_id` is `None`. Calling this twice creates two review apps.
    ///
    /// # Errors
    ///
    /// Platform errors are returned unchanged. A failed follow-up fetch leaves
    /// the created review app in place.
    pub async fn create_review_app(&self, request: ReviewAppRequest) -> Result<CreatedReviewApp> {
        let body = NewReviewApp::new(request, &self.pipeline);

        self.logger.info("Creating Review App");
        self.logger.debug(&serde_json::to_string(&body)?);

        let created = self.api.create_review_app(&body).await?;
        let id = created.id;

        self.logger.info(&format!("Review App created {id}"));
        self.logger
            .info(&format!("Get app ID for review app ID {id}"));

        let fetched = self.api.get_review_app(&id).await?;
        let app_id = fetched.app_id().map(str::to_string);

        self.logger.info(&format!(
            "Got app ID {} for review app ID {id}",
            app_id.as_deref().unwrap_or("(pending)")
        ));

        Ok(CreatedReviewApp {
            review_app_id: id,
            app_id,
        })
    }

    /// Delete the review app of pull request `pr_number`, if there is one.
    ///
    /// # Errors
    ///
    /// Platform errors from listing or deleting are returned unchanged. A
    /// missing review app is [`DestroyOutcome::NotFound`], not an error.
    pub async fn destroy_review_app(&self, pr_number: u64) -> Result<DestroyOutcome> {
        self.logger.info("Fetching Review Apps list");

        let review_apps = self.api.list_review_apps(&self.pipeline).await?;

        let Some(review_app) = review_apps
            .into_iter()
            .find(|ra| ra.pr_number == Some(pr_number))
        else {
            self.logger.info("Review App not found (nothing to do)");
            return Ok(DestroyOutcome::NotFound);
        };

        self.logger.info("Destroying Review App");

        self.api.delete_review_app(&review_app.id).await?;

        self.logger.info("Review App destroyed");

        Ok(DestroyOutcome::Destroyed(review_app))
    }

    /// Best-effort lookup of an application's public URL.
    ///
    /// Never fails: an absent id yields `None` without a request, and a
    /// platform error is logged as a warning and yields `None`.
    pub async fn get_app_web_url(&self, app_id: Option<&str>) -> Option<String> {
        let id = app_id?;

        match self.api.get_app(id).await {
            Ok(app) => app.web_url,
            Err(e) => {
                self.logger
                    .warning(&format!("Unable to fetch web_url for id {id}"));
                self.logger.warning(&e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use revapp_core::diagnostics::{Level, MemoryLogger};
    use revapp_core::{ReviewAppError, SnapshotUrl};

    use super::*;
    use crate::types::{App, AppRef, ReviewApp};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Create(NewReviewApp),
        Get(String),
        List(String),
        Delete(String),
        GetApp(String),
    }

    #[derive(Default)]
    struct FakePlatform {
        calls: Mutex<Vec<Call>>,
        fetched_app: Option<String>,
        listing: Vec<ReviewApp>,
        app_error: bool,
        create_error: bool,
        fetch_error: bool,
    }

    impl FakePlatform {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn review_app(id: &str, pr_number: u64) -> ReviewApp {
        ReviewApp {
            id: id.into(),
            pr_number: Some(pr_number),
            app: Some(AppRef {
                id: format!("app_of_{id}"),
            }),
            branch: None,
            status: None,
        }
    }

    #[async_trait]
    impl PlatformApi for FakePlatform {
        async fn create_review_app(&self, body: &NewReviewApp) -> Result<ReviewApp> {
            self.record(Call::Create(body.clone()));
            if self.create_error {
                return Err(ReviewAppError::Platform(
                    "Heroku API error 422 (invalid_params): pr_number is taken".into(),
                ));
            }
            Ok(ReviewApp {
                id: "ra_1".into(),
                pr_number: Some(body.pr_number),
                app: None,
                branch: Some(body.branch.clone()),
                status: Some("pending".into()),
            })
        }

        async fn get_review_app(&self, id: &str) -> Result<ReviewApp> {
            self.record(Call::Get(id.into()));
            if self.fetch_error {
                return Err(ReviewAppError::Platform("Heroku API error 500".into()));
            }
            Ok(ReviewApp {
                id: id.into(),
                pr_number: Some(42),
                app: self.fetched_app.clone().map(|id| AppRef { id }),
                branch: None,
                status: None,
            })
        }

        async fn list_review_apps(&self, pipeline: &str) -> Result<Vec<ReviewApp>> {
            self.record(Call::List(pipeline.into()));
            Ok(self.listing.clone())
        }

        async fn delete_review_app(&self, id: &str) -> Result<ReviewApp> {
            self.record(Call::Delete(id.into()));
            Ok(review_app(id, 0))
        }

        async fn get_app(&self, id: &str) -> Result<App> {
            self.record(Call::GetApp(id.into()));
            if self.app_error {
                return Err(ReviewAppError::Platform("Heroku API error 404".into()));
            }
            Ok(App {
                id: id.into(),
                name: None,
                web_url: Some(format!("https://{id}.example")),
            })
        }
    }

    fn request() -> ReviewAppRequest {
        ReviewAppRequest {
            branch: "feat".into(),
            pr_number: 42,
            url: SnapshotUrl::new("https://dl/abc123.tgz"),
            version: "abc123".into(),
        }
    }

    #[tokio::test]
    async fn failed_create_stops_before_fetch() {
        let platform = Arc::new(FakePlatform {
            create_error: true,
            fetched_app: Some("app_9".into()),
            ..FakePlatform::default()
        });
        let logger = Arc::new(MemoryLogger::new());
        let manager =
            ReviewAppManager::new(platform.clone(), "pipe-1").with_logger(logger.clone());

        let err = manager.create_review_app(request()).await.unwrap_err();

        assert!(matches!(err, ReviewAppError::Platform(_)));
        assert!(err.to_string().contains("pr_number is taken"));
        assert_eq!(platform.calls().len(), 1);
        assert!(matches!(platform.calls()[0], Call::Create(_)));
        assert_eq!(logger.messages(Level::Info), vec!["Creating Review App"]);
    }

    #[tokio::test]
    async fn create_posts_then_fetches_with_configured_pipeline() {
        let platform = Arc::new(FakePlatform {
            fetched_app: Some("app_9".into()),
            ..FakePlatform::default()
        });
        let manager = ReviewAppManager::new(platform.clone(), "pipe-1");

        let created = manager.create_review_app(request()).await.unwrap();

        assert_eq!(
            created,
            CreatedReviewApp {
                review_app_id: "ra_1".into(),
                app_id: Some("app_9".into()),
            }
        );
        let calls = platform.calls();
        assert_eq!(calls.len(), 2);
        let Call::Create(body) = &calls[0] else {
            panic!("expected create first, got {:?}", calls[0]);
        };
        assert_eq!(body.pipeline, "pipe-1");
        assert_eq!(body.source_blob.url, "https://dl/abc123.tgz");
        assert_eq!(body.source_blob.version, "abc123");
        assert_eq!(calls[1], Call::Get("ra_1".into()));
    }

    #[tokio::test]
    async fn create_tolerates_pending_app_id() {
        let platform = Arc::new(FakePlatform::default());
        let manager = ReviewAppManager::new(platform, "pipe-1");

        let created = manager.create_review_app(request()).await.unwrap();

        assert_eq!(created.review_app_id, "ra_1");
        assert_eq!(created.app_id, None);
    }

    #[tokio::test]
    async fn create_propagates_fetch_failure_without_rollback() {
        let platform = Arc::new(FakePlatform {
            fetch_error: true,
            ..FakePlatform::default()
        });
        let manager = ReviewAppManager::new(platform.clone(), "pipe-1");

        let err = manager.create_review_app(request()).await.unwrap_err();

        assert!(err.is_remote());
        assert!(!platform
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Delete(_))));
    }

    #[tokio::test]
    async fn destroy_deletes_the_matching_review_app() {
        let platform = Arc::new(FakePlatform {
            listing: vec![review_app("ra_1", 42), review_app("ra_2", 7)],
            ..FakePlatform::default()
        });
        let manager = ReviewAppManager::new(platform.clone(), "pipe-1");

        let outcome = manager.destroy_review_app(42).await.unwrap();

        assert_eq!(outcome.review_app().map(|ra| ra.id.as_str()), Some("ra_1"));
        assert_eq!(
            platform.calls(),
            vec![Call::List("pipe-1".into()), Call::Delete("ra_1".into())]
        );
    }

    #[tokio::test]
    async fn destroy_without_match_is_a_no_op() {
        let logger = Arc::new(MemoryLogger::new());
        let platform = Arc::new(FakePlatform {
            listing: vec![review_app("ra_2", 7)],
            ..FakePlatform::default()
        });
        let manager =
            ReviewAppManager::new(platform.clone(), "pipe-1").with_logger(logger.clone());

        let outcome = manager.destroy_review_app(42).await.unwrap();

        assert_eq!(outcome, DestroyOutcome::NotFound);
        assert_eq!(platform.calls(), vec![Call::List("pipe-1".into())]);
        assert!(logger
            .messages(Level::Info)
            .contains(&"Review App not found (nothing to do)".to_string()));
    }

    #[tokio::test]
    async fn destroy_picks_first_of_duplicate_matches() {
        let platform = Arc::new(FakePlatform {
            listing: vec![
                review_app("ra_7", 7),
                review_app("ra_a", 42),
                review_app("ra_b", 42),
            ],
            ..FakePlatform::default()
        });
        let manager = ReviewAppManager::new(platform.clone(), "pipe-1");

        manager.destroy_review_app(42).await.unwrap();

        let deletes: Vec<Call> = platform
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Delete(_)))
            .collect();
        assert_eq!(deletes, vec![Call::Delete("ra_a".into())]);
    }

    #[tokio::test]
    async fn destroy_is_repeatable_when_absent() {
        let platform = Arc::new(FakePlatform::default());
        let manager = ReviewAppManager::new(platform, "pipe-1");

        assert_eq!(
            manager.destroy_review_app(42).await.unwrap(),
            DestroyOutcome::NotFound
        );
        assert_eq!(
            manager.destroy_review_app(42).await.unwrap(),
            DestroyOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn web_url_skips_platform_for_absent_id() {
        let platform = Arc::new(FakePlatform::default());
        let manager = ReviewAppManager::new(platform.clone(), "pipe-1");

        assert_eq!(manager.get_app_web_url(None).await, None);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn web_url_failure_degrades_to_warning() {
        let logger = Arc::new(MemoryLogger::new());
        let platform = Arc::new(FakePlatform {
            app_error: true,
            ..FakePlatform::default()
        });
        let manager =
            ReviewAppManager::new(platform, "pipe-1").with_logger(logger.clone());

        assert_eq!(manager.get_app_web_url(Some("app_9")).await, None);

        let warnings = logger.messages(Level::Warning);
        assert_eq!(warnings[0], "Unable to fetch web_url for id app_9");
        assert!(warnings[1].contains("404"));
    }

    #[tokio::test]
    async fn web_url_is_returned_on_success() {
        let platform = Arc::new(FakePlatform::default());
        let manager = ReviewAppManager::new(platform, "pipe-1");

        assert_eq!(
            manager.get_app_web_url(Some("app_9")).await.as_deref(),
            Some("https://app_9.example")
        );
    }
}
