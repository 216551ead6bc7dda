use async_trait::async_trait;
use revapp_core::Result;
use serde::{Deserialize, Serialize};

/// Where the source host says the archive for a ref can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLocation {
    /// HTTP status of the location request.
    pub status: u16,
    /// Download URL of the archive.
    pub url: String,
}

/// Source-hosting API able to locate a repository archive without
/// transferring it.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Resolve the tarball location of `git_ref` in `owner/repo`.
    async fn archive_location(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<ArchiveLocation>;
}
