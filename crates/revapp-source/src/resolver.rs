use std::sync::Arc;

use revapp_core::{diagnostics, Logger, Result, ReviewAppError, SnapshotUrl};

use crate::host::SourceHost;

/// Maps a repository ref to a downloadable source snapshot URL.
///
/// The host is optional so the resolver can be assembled without source
/// credentials; resolving then fails before any request is made.
pub struct SourceResolver {
    host: Option<Arc<dyn SourceHost>>,
    logger: Arc<dyn Logger>,
}

impl SourceResolver {
    pub fn new(host: Option<Arc<dyn SourceHost>>) -> Self {
        Self {
            host,
            logger: diagnostics::noop(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Whether a source host is attached.
    pub fn is_connected(&self) -> bool {
        self.host.is_some()
    }

    /// Resolve the tarball URL for `git_ref` in `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Config`] when no host is attached; host
    /// errors are returned unchanged.
    pub async fn resolve_snapshot(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<SnapshotUrl> {
        let Some(host) = &self.host else {
            return Err(ReviewAppError::Config(
                "Couldn't connect to GitHub, make sure the GITHUB_TOKEN is a valid token".into(),
            ));
        };

        self.logger.debug("Fetching tarball URL");

        let location = host.archive_location(owner, repo, git_ref).await?;

        self.logger
            .debug(&format!("Fetched tarball URL {}", location.url));

        Ok(SnapshotUrl::new(location.url))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use revapp_core::diagnostics::{Level, MemoryLogger};

    use super::*;
    use crate::host::ArchiveLocation;

    #[derive(Default)]
    struct FakeHost {
        calls: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl SourceHost for FakeHost {
        async fn archive_location(
            &self,
            owner: &str,
            repo: &str,
            git_ref: &str,
        ) -> Result<ArchiveLocation> {
            self.calls
                .lock()
                .unwrap()
                .push((owner.into(), repo.into(), git_ref.into()));
            if self.fail {
                return Err(ReviewAppError::SourceHost("GitHub API error 401".into()));
            }
            Ok(ArchiveLocation {
                status: 302,
                url: format!("https://dl/{git_ref}.tgz"),
            })
        }
    }

    #[tokio::test]
    async fn returns_host_url_unchanged() {
        let host = Arc::new(FakeHost::default());
        let resolver = SourceResolver::new(Some(host.clone()));

        let url = resolver.resolve_snapshot("o", "r", "abc123").await.unwrap();

        assert_eq!(url.as_str(), "https://dl/abc123.tgz");
        assert_eq!(
            *host.calls.lock().unwrap(),
            vec![("o".to_string(), "r".to_string(), "abc123".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_host_is_config_error() {
        let resolver = SourceResolver::new(None);
        assert!(!resolver.is_connected());

        let err = resolver.resolve_snapshot("o", "r", "feat").await.unwrap_err();
        assert!(matches!(err, ReviewAppError::Config(_)));
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[tokio::test]
    async fn host_errors_propagate_unchanged() {
        let host = Arc::new(FakeHost {
            fail: true,
            ..FakeHost::default()
        });
        let resolver = SourceResolver::new(Some(host));

        let err = resolver.resolve_snapshot("o", "r", "feat").await.unwrap_err();
        assert_eq!(err.to_string(), "source host error: GitHub API error 401");
    }

    #[tokio::test]
    async fn emits_fetching_and_fetched_traces() {
        let logger = Arc::new(MemoryLogger::new());
        let resolver =
            SourceResolver::new(Some(Arc::new(FakeHost::default()))).with_logger(logger.clone());

        resolver.resolve_snapshot("o", "r", "feat").await.unwrap();

        assert_eq!(
            logger.messages(Level::Debug),
            vec!["Fetching tarball URL", "Fetched tarball URL https://dl/feat.tgz"]
        );
    }
}
