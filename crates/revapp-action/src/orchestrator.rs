use std::sync::Arc;

use revapp_core::{
    Action, ActionConfig, Logger, Outputs, PullRequestContext, Result, ReviewAppError,
};
use revapp_deploy::{DestroyOutcome, HerokuClient, ReviewAppManager, ReviewAppRequest};
use revapp_source::{GitHubArchiveClient, SourceHost, SourceResolver};
use serde::Serialize;

/// What a run did, and the identifiers it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A review app was requested for the pull request.
    Created {
        review_app_id: String,
        app_id: Option<String>,
        web_url: Option<String>,
    },
    /// Teardown ran; `review_app_id` is `None` when there was nothing to remove.
    Destroyed {
        review_app_id: Option<String>,
        app_id: Option<String>,
    },
    /// The action was not recognized and nothing was done.
    Skipped { requested: String },
}

impl RunOutcome {
    /// Step outputs for this outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use revapp_action::RunOutcome;
    ///
    /// let outcome = RunOutcome::Created {
    ///     review_app_id: "ra_1".into(),
    ///     app_id: Some("app_9".into()),
    ///     web_url: None,
    /// };
    /// let outputs = outcome.outputs();
    /// assert_eq!(outputs.get("app_id"), Some("app_9"));
    /// assert_eq!(outputs.get("web_url"), Some(""));
    /// ```
    pub fn outputs(&self) -> Outputs {
        let mut outputs = Outputs::new();
        match self {
            Self::Created {
                review_app_id,
                app_id,
                web_url,
            } => {
                outputs.set("review_app_id", review_app_id.as_str());
                outputs.set_optional("app_id", app_id.as_deref());
                outputs.set_optional("web_url", web_url.as_deref());
            }
            Self::Destroyed {
                review_app_id,
                app_id,
            } => {
                outputs.set_optional("review_app_id", review_app_id.as_deref());
                outputs.set_optional("app_id", app_id.as_deref());
            }
            Self::Skipped { .. } => {}
        }
        outputs
    }
}

impl From<DestroyOutcome> for RunOutcome {
    fn from(outcome: DestroyOutcome) -> Self {
        match outcome {
            DestroyOutcome::Destroyed(ra) => Self::Destroyed {
                app_id: ra.app_id().map(str::to_string),
                review_app_id: Some(ra.id),
            },
            DestroyOutcome::NotFound => Self::Destroyed {
                review_app_id: None,
                app_id: None,
            },
        }
    }
}

/// Dispatches one action for one pull request.
pub struct Orchestrator {
    source: SourceResolver,
    deploy: ReviewAppManager,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(source: SourceResolver, deploy: ReviewAppManager, logger: Arc<dyn Logger>) -> Self {
        Self {
            source,
            deploy,
            logger,
        }
    }

    /// Assemble the Heroku and GitHub clients described by `config`.
    ///
    /// The GitHub client is only attached when a token is configured; without
    /// one, `create` fails with a configuration error before any request.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &ActionConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        let heroku = HerokuClient::from_config(&config.platform)?;
        let deploy = ReviewAppManager::new(Arc::new(heroku), config.platform.pipeline.clone())
            .with_logger(logger.clone());

        let host = GitHubArchiveClient::from_config(&config.source)?
            .map(|client| Arc::new(client) as Arc<dyn SourceHost>);
        let source = SourceResolver::new(host).with_logger(logger.clone());

        Ok(Self::new(source, deploy, logger))
    }

    /// Run `action` for `pr`.
    ///
    /// # Errors
    ///
    /// Configuration and remote errors are returned unchanged. An unrecognized
    /// action is not an error.
    pub async fn run(&self, action: &Action, pr: &PullRequestContext) -> Result<RunOutcome> {
        match action {
            Action::Create => self.create(pr).await,
            Action::Destroy => {
                let outcome = self.deploy.destroy_review_app(pr.number).await?;
                Ok(outcome.into())
            }
            Action::Unrecognized(requested) => {
                self.logger.warning(
                    "Invalid action, no action was performed, use one of 'create' or 'destroy'",
                );
                Ok(RunOutcome::Skipped {
                    requested: requested.clone(),
                })
            }
        }
    }

    async fn create(&self, pr: &PullRequestContext) -> Result<RunOutcome> {
        if !self.source.is_connected() {
            return Err(ReviewAppError::Config(
                "GITHUB_TOKEN is required to create review apps".into(),
            ));
        }

        let url = self
            .source
            .resolve_snapshot(&pr.owner, &pr.repo, &pr.head_ref)
            .await?;

        let created = self
            .deploy
            .create_review_app(ReviewAppRequest {
                branch: pr.head_ref.clone(),
                pr_number: pr.number,
                url,
                version: pr.head_sha.clone(),
            })
            .await?;

        let web_url = self.deploy.get_app_web_url(created.app_id.as_deref()).await;

        Ok(RunOutcome::Created {
            review_app_id: created.review_app_id,
            app_id: created.app_id,
            web_url,
        })
    }
}
