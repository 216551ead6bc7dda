//! Pull request context from the GitHub Actions event payload.

use std::path::Path;

use serde::Deserialize;

use crate::error::ReviewAppError;
use crate::Result;
use crate::types::PullRequestContext;

/// Environment variable pointing at the event payload file.
pub const GITHUB_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
/// Environment variable holding `owner/repo`.
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestPayload>,
    repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: Option<u64>,
    head: Option<HeadPayload>,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: Option<String>,
    owner: Option<OwnerPayload>,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: Option<String>,
}

/// Read and parse the event payload at `path`.
///
/// # Errors
///
/// Returns [`ReviewAppError::Io`] if the file cannot be read, otherwise the
/// errors of [`pull_request_from_json`].
pub fn pull_request_from_file(path: &Path, repository: Option<&str>) -> Result<PullRequestContext> {
    let content = std::fs::read_to_string(path)?;
    pull_request_from_json(&content, repository)
}

/// Extract the pull request context from an event payload.
///
/// `repository` is the `owner/repo` fallback (normally `GITHUB_REPOSITORY`)
/// used when the payload carries no `repository` object.
///
/// # Errors
///
/// Returns [`ReviewAppError::Serialization`] for malformed JSON and
/// [`ReviewAppError::MissingContext`] if the payload is not a pull request
/// event or lacks a required field.
///
/// # Examples
///
/// ```
/// use revapp_core::event::pull_request_from_json;
///
/// let payload = r#"{
///     "pull_request": { "number": 42, "head": { "ref": "feat", "sha": "abc123" } },
///     "repository": { "name": "r", "owner": { "login": "o" } }
/// }"#;
/// let pr = pull_request_from_json(payload, None).unwrap();
/// assert_eq!(pr.number, 42);
/// assert_eq!(pr.head_ref, "feat");
/// assert_eq!(pr.owner, "o");
/// ```
pub fn pull_request_from_json(
    payload: &str,
    repository: Option<&str>,
) -> Result<PullRequestContext> {
    let event: EventPayload = serde_json::from_str(payload)?;

    let Some(pr) = event.pull_request else {
        return Err(ReviewAppError::MissingContext(
            "Missing pull_request payload context".into(),
        ));
    };

    let number = pr.number.ok_or_else(|| missing("pull_request.number"))?;
    let head = pr.head.ok_or_else(|| missing("pull_request.head"))?;
    let head_ref = head.git_ref.ok_or_else(|| missing("pull_request.head.ref"))?;
    let head_sha = head.sha.ok_or_else(|| missing("pull_request.head.sha"))?;

    let from_payload = event.repository.and_then(|r| {
        let owner = r.owner.and_then(|o| o.login)?;
        Some((owner, r.name?))
    });
    let (owner, repo) = match from_payload {
        Some(pair) => pair,
        None => repository
            .and_then(split_repository)
            .ok_or_else(|| missing("repository"))?,
    };

    Ok(PullRequestContext {
        number,
        head_ref,
        head_sha,
        owner,
        repo,
    })
}

fn split_repository(full_name: &str) -> Option<(String, String)> {
    let (owner, repo) = full_name.split_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

fn missing(field: &str) -> ReviewAppError {
    ReviewAppError::MissingContext(format!("event payload has no {field}"))
}
