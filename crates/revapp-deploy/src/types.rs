use revapp_core::SnapshotUrl;
use serde::{Deserialize, Serialize};

/// A review app as the platform reports it.
///
/// The nested application is provisioned asynchronously and is frequently
/// absent right after creation.
///
/// # Examples
///
/// ```
/// use revapp_deploy::ReviewApp;
///
/// let ra: ReviewApp = serde_json::from_str(r#"{"id": "ra_1", "pr_number": 42, "app": null}"#).unwrap();
/// assert_eq!(ra.id, "ra_1");
/// assert_eq!(ra.app_id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewApp {
    /// Platform-assigned review app id.
    pub id: String,
    /// Pull request number the review app belongs to.
    #[serde(default)]
    pub pr_number: Option<u64>,
    /// Underlying application, once provisioned.
    #[serde(default)]
    pub app: Option<AppRef>,
    #[serde(default)]
    pub branch: Option<String>,
    /// Provisioning status, e.g. `pending`, `creating`, `created`.
    #[serde(default)]
    pub status: Option<String>,
}

impl ReviewApp {
    /// Id of the underlying application, if provisioned.
    pub fn app_id(&self) -> Option<&str> {
        self.app.as_ref().map(|a| a.id.as_str())
    }
}

/// Reference to an application nested in another record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRef {
    pub id: String,
}

/// An application as returned by `GET /apps/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Externally reachable URL.
    #[serde(default)]
    pub web_url: Option<String>,
}

/// What the caller asks to be deployed for a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewAppRequest {
    /// Head branch of the pull request.
    pub branch: String,
    pub pr_number: u64,
    /// Source snapshot to build from.
    pub url: SnapshotUrl,
    /// Commit SHA of the snapshot.
    pub version: String,
}

/// Body of `POST /review-apps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReviewApp {
    pub branch: String,
    pub pipeline: String,
    pub source_blob: SourceBlob,
    pub pr_number: u64,
}

impl NewReviewApp {
    /// Build the platform body for `request` in `pipeline`.
    pub fn new(request: ReviewAppRequest, pipeline: &str) -> Self {
        Self {
            branch: request.branch,
            pipeline: pipeline.to_string(),
            source_blob: SourceBlob {
                url: request.url.into_string(),
                version: request.version,
            },
            pr_number: request.pr_number,
        }
    }
}

/// Location and version of the source archive to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBlob {
    pub url: String,
    pub version: String,
}

/// Identifiers known after creating a review app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReviewApp {
    pub review_app_id: String,
    /// Absent when the platform has not provisioned the app yet.
    pub app_id: Option<String>,
}

/// Result of tearing down the review app of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The matching review app was deleted.
    Destroyed(ReviewApp),
    /// No review app matched; nothing was deleted.
    NotFound,
}

impl DestroyOutcome {
    /// The deleted review app, if any.
    pub fn review_app(&self) -> Option<&ReviewApp> {
        match self {
            Self::Destroyed(ra) => Some(ra),
            Self::NotFound => None,
        }
    }
}
