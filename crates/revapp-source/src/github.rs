use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Url;
use revapp_core::{Result, ReviewAppError, SourceConfig};

use crate::host::{ArchiveLocation, SourceHost};

/// GitHub REST client that resolves tarball download URLs.
///
/// Issues a `HEAD` request against the tarball endpoint with redirects
/// disabled, so only the redirect target is read and no archive bytes
/// are transferred.
///
/// # Examples
///
/// ```
/// use revapp_source::github::GitHubArchiveClient;
///
/// let client = GitHubArchiveClient::new("https://api.github.com", "ghp_xxxx").unwrap();
/// assert_eq!(client.base_url(), "https://api.github.com");
/// ```
pub struct GitHubArchiveClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubArchiveClient {
    /// Create a client for the API at `base_url` authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::SourceHost`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::build(base_url, token, std::time::Duration::from_secs(30))
    }

    /// Create a client from configuration.
    ///
    /// Returns `Ok(None)` when no token is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::SourceHost`] if the HTTP client cannot be built.
    pub fn from_config(config: &SourceConfig) -> Result<Option<Self>> {
        config
            .token
            .as_deref()
            .map(|token| Self::build(&config.base_url, token, config.timeout))
            .transpose()
    }

    fn build(base_url: &str, token: &str, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ReviewAppError::SourceHost(format!("failed to create GitHub client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Tarball endpoint for `git_ref`. Each `/`-separated component of the
    /// ref becomes its own percent-encoded path segment.
    fn tarball_url(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Url> {
        let invalid =
            || ReviewAppError::SourceHost(format!("invalid GitHub API URL {}", self.base_url));

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(["repos", owner, repo, "tarball"])
            .extend(git_ref.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl SourceHost for GitHubArchiveClient {
    async fn archive_location(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<ArchiveLocation> {
        let url = self.tarball_url(owner, repo, git_ref)?;
        debug!("HEAD {url}");

        let response = self
            .http
            .head(url.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(USER_AGENT, "revapp")
            .send()
            .await
            .map_err(|e| ReviewAppError::SourceHost(format!("failed to fetch tarball URL: {e}")))?;

        let status = response.status();
        debug!("HEAD {url} -> {status}");

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    ReviewAppError::SourceHost(format!(
                        "GitHub API returned {status} without a Location header"
                    ))
                })?;
            return Ok(ArchiveLocation {
                status: status.as_u16(),
                url: location.to_string(),
            });
        }

        if status.is_success() {
            return Ok(ArchiveLocation {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(ReviewAppError::SourceHost(format!(
            "GitHub API error {status}: {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn redirect_location_becomes_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/repos/o/r/tarball/feat")
            .match_header("authorization", "Bearer gh-token")
            .match_header("user-agent", "revapp")
            .with_status(302)
            .with_header("location", "https://codeload.github.com/o/r/legacy.tar.gz/refs/heads/feat?token=T")
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&server.url(), "gh-token").unwrap();
        let location = client.archive_location("o", "r", "feat").await.unwrap();

        assert_eq!(location.status, 302);
        assert_eq!(
            location.url,
            "https://codeload.github.com/o/r/legacy.tar.gz/refs/heads/feat?token=T"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn redirect_is_not_followed() {
        let mut server = Server::new_async().await;
        let target = format!("{}/archive.tgz", server.url());
        let head = server
            .mock("HEAD", "/repos/o/r/tarball/main")
            .with_status(302)
            .with_header("location", &target)
            .create_async()
            .await;
        let archive = server
            .mock("HEAD", "/archive.tgz")
            .expect(0)
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&server.url(), "t").unwrap();
        let location = client.archive_location("o", "r", "main").await.unwrap();

        assert_eq!(location.url, target);
        head.assert_async().await;
        archive.assert_async().await;
    }

    #[tokio::test]
    async fn ref_characters_are_percent_encoded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/repos/o/r/tarball/fix%2312")
            .with_status(302)
            .with_header("location", "https://dl/fix.tgz")
            .create_async()
            .await;
        let truncated = server
            .mock("HEAD", "/repos/o/r/tarball/fix")
            .expect(0)
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&server.url(), "t").unwrap();
        let location = client.archive_location("o", "r", "fix#12").await.unwrap();

        assert_eq!(location.url, "https://dl/fix.tgz");
        mock.assert_async().await;
        truncated.assert_async().await;
    }

    #[tokio::test]
    async fn slashes_in_ref_stay_path_separators() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/repos/o/r/tarball/feature/50%25-off")
            .with_status(302)
            .with_header("location", "https://dl/feature.tgz")
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&format!("{}/", server.url()), "t").unwrap();
        let location = client
            .archive_location("o", "r", "feature/50%-off")
            .await
            .unwrap();

        assert_eq!(location.url, "https://dl/feature.tgz");
        mock.assert_async().await;
    }

    #[test]
    fn tarball_url_keeps_api_prefix() {
        let client = GitHubArchiveClient::new("https://ghe.internal/api/v3", "t").unwrap();
        let url = client.tarball_url("o", "r", "main").unwrap();
        assert_eq!(url.as_str(), "https://ghe.internal/api/v3/repos/o/r/tarball/main");
    }

    #[tokio::test]
    async fn error_status_is_source_host_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/repos/o/r/tarball/feat")
            .with_status(404)
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&server.url(), "t").unwrap();
        let err = client.archive_location("o", "r", "feat").await.unwrap_err();

        assert!(matches!(err, ReviewAppError::SourceHost(_)));
        assert!(err.to_string().contains("404"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn redirect_without_location_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/repos/o/r/tarball/feat")
            .with_status(302)
            .create_async()
            .await;

        let client = GitHubArchiveClient::new(&server.url(), "t").unwrap();
        let result = client.archive_location("o", "r", "feat").await;
        assert!(matches!(result, Err(ReviewAppError::SourceHost(_))));
    }

    #[test]
    fn from_config_without_token_builds_nothing() {
        let config = SourceConfig {
            token: None,
            base_url: "https://api.github.com".into(),
            timeout: std::time::Duration::from_secs(5),
        };
        assert!(GitHubArchiveClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = GitHubArchiveClient::new("https://ghe.internal/api/v3/", "t").unwrap();
        assert_eq!(client.base_url(), "https://ghe.internal/api/v3");
    }
}
