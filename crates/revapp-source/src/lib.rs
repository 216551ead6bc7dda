//! Source snapshot resolution.
//!
//! Provides the [`SourceHost`](host::SourceHost) seam, its GitHub REST
//! implementation, and the [`SourceResolver`](resolver::SourceResolver)
//! that turns a repository ref into a time-limited tarball URL.

pub mod github;
pub mod host;
pub mod resolver;

pub use github::GitHubArchiveClient;
pub use host::{ArchiveLocation, SourceHost};
pub use resolver::SourceResolver;
