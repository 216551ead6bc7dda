use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReviewAppError;
use crate::Result;

/// Environment variable holding the Heroku Platform API token.
pub const HEROKU_API_TOKEN: &str = "HEROKU_API_TOKEN";
/// Environment variable holding the Heroku pipeline id.
pub const HEROKU_PIPELINE_ID: &str = "HEROKU_PIPELINE_ID";
/// Environment variable overriding the Heroku API base URL.
pub const HEROKU_API_URL: &str = "HEROKU_API_URL";
/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Environment variable overriding the GitHub API base URL (set by the Actions runner).
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";

/// Optional settings loaded from `.revapp.toml`.
///
/// Tokens are never read from the file; only the environment supplies them.
///
/// # Examples
///
/// ```
/// use revapp_core::FileConfig;
///
/// let config = FileConfig::default();
/// assert_eq!(config.platform.base_url, "https://api.heroku.com");
/// assert_eq!(config.source.base_url, "https://api.github.com");
/// assert!(config.platform.pipeline.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Deployment platform settings.
    #[serde(default)]
    pub platform: PlatformSection,
    /// Source host settings.
    #[serde(default)]
    pub source: SourceSection,
}

impl FileConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Io`] if the file cannot be read, or
    /// [`ReviewAppError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use revapp_core::FileConfig;
    ///
    /// let toml = r#"
    /// [platform]
    /// pipeline = "0f7a2c1e"
    /// "#;
    /// let config = FileConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.platform.pipeline.as_deref(), Some("0f7a2c1e"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// `[platform]` table of `.revapp.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    /// Pipeline id, used when `HEROKU_PIPELINE_ID` is not set.
    pub pipeline: Option<String>,
    /// Platform API base URL (default: `https://api.heroku.com`).
    #[serde(default = "default_platform_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// `[source]` table of `.revapp.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Source host API base URL (default: `https://api.github.com`).
    #[serde(default = "default_source_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_platform_url() -> String {
    "https://api.heroku.com".into()
}

fn default_source_url() -> String {
    "https://api.github.com".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            pipeline: None,
            base_url: default_platform_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: default_source_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Validated run configuration.
///
/// Built once at startup by layering the environment over a [`FileConfig`].
/// Resolution order: environment > file > defaults.
#[derive(Clone)]
pub struct ActionConfig {
    /// Deployment platform access.
    pub platform: PlatformConfig,
    /// Source host access.
    pub source: SourceConfig,
}

/// Credentials and location of the deployment platform.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Heroku API token.
    pub api_token: String,
    /// Pipeline all review apps belong to.
    pub pipeline: String,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Credentials and location of the source host.
#[derive(Clone)]
pub struct SourceConfig {
    /// GitHub token; only `create` needs it.
    pub token: Option<String>,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ActionConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ActionConfig::resolve`].
    pub fn from_env(file: FileConfig) -> Result<Self> {
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Resolve configuration using `lookup` for environment values.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Config`] if the platform token or pipeline
    /// id is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use revapp_core::{ActionConfig, FileConfig};
    ///
    /// let config = ActionConfig::resolve(FileConfig::default(), |key| match key {
    ///     "HEROKU_API_TOKEN" => Some("token".into()),
    ///     "HEROKU_PIPELINE_ID" => Some("pipe".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.platform.pipeline, "pipe");
    /// assert!(config.source.token.is_none());
    /// ```
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_token = get(HEROKU_API_TOKEN);
        let pipeline = get(HEROKU_PIPELINE_ID).or(file.platform.pipeline);
        let (Some(api_token), Some(pipeline)) = (api_token, pipeline) else {
            return Err(ReviewAppError::Config(format!(
                "{HEROKU_API_TOKEN} and {HEROKU_PIPELINE_ID} are both required"
            )));
        };

        let platform_url = get(HEROKU_API_URL).unwrap_or(file.platform.base_url);
        let source_url = get(GITHUB_API_URL).unwrap_or(file.source.base_url);

        Ok(Self {
            platform: PlatformConfig {
                api_token,
                pipeline,
                base_url: platform_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(file.platform.timeout_secs),
            },
            source: SourceConfig {
                token: get(GITHUB_TOKEN),
                base_url: source_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(file.source.timeout_secs),
            },
        })
    }
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("api_token", &"<redacted>")
            .field("pipeline", &self.pipeline)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("platform", &self.platform)
            .field("source", &self.source)
            .finish()
    }
}
