use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The operation requested for this run.
///
/// Parsing never fails: anything other than `create` or `destroy` becomes
/// [`Action::Unrecognized`], which the orchestrator treats as a no-op.
///
/// # Examples
///
/// ```
/// use revapp_core::Action;
///
/// assert_eq!("create".parse::<Action>().unwrap(), Action::Create);
/// assert_eq!(" destroy\n".parse::<Action>().unwrap(), Action::Destroy);
/// assert_eq!(
///     "Create".parse::<Action>().unwrap(),
///     Action::Unrecognized("Create".into())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Provision a review app for the pull request.
    Create,
    /// Tear down the review app of the pull request.
    Destroy,
    /// Any other value, kept verbatim for the warning.
    Unrecognized(String),
}

impl Action {
    /// Parse a raw action input. Surrounding whitespace is ignored.
    pub fn from_input(input: &str) -> Self {
        match input.trim() {
            "create" => Self::Create,
            "destroy" => Self::Destroy,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_input(s))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Destroy => write!(f, "destroy"),
            Self::Unrecognized(value) => write!(f, "{value}"),
        }
    }
}

/// The pull request that triggered the run.
///
/// # Examples
///
/// ```
/// use revapp_core::PullRequestContext;
///
/// let pr = PullRequestContext {
///     number: 42,
///     head_ref: "feat".into(),
///     head_sha: "abc123".into(),
///     owner: "o".into(),
///     repo: "r".into(),
/// };
/// assert_eq!(pr.to_string(), "o/r#42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestContext {
    /// Pull request number; the correlation key on the platform.
    pub number: u64,
    /// Head branch name.
    pub head_ref: String,
    /// Head commit SHA.
    pub head_sha: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl fmt::Display for PullRequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Time-limited download URL of a source archive at one commit.
///
/// # Examples
///
/// ```
/// use revapp_core::SnapshotUrl;
///
/// let url = SnapshotUrl::new("https://codeload.github.com/o/r/legacy.tar.gz/feat");
/// assert!(url.as_str().ends_with("/feat"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotUrl(String);

impl SnapshotUrl {
    /// Wrap a URL returned by the source host.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Borrow the URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the URL.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SnapshotUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
