/// Errors that can occur while provisioning or tearing down a review app.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary, where the diagnostic codes and help
/// texts are rendered.
///
/// # Examples
///
/// ```
/// use revapp_core::ReviewAppError;
///
/// let err = ReviewAppError::Platform("Heroku API error 503".into());
/// assert_eq!(err.to_string(), "platform error: Heroku API error 503");
/// assert!(err.is_remote());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReviewAppError {
    /// Required credentials or identifiers are missing or invalid.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(revapp::config),
        help("set HEROKU_API_TOKEN and HEROKU_PIPELINE_ID; create also needs GITHUB_TOKEN")
    )]
    Config(String),

    /// The triggering event does not describe a pull request.
    #[error("missing context: {0}")]
    #[diagnostic(
        code(revapp::context),
        help("run on pull_request events, or pass --event with a pull request payload")
    )]
    MissingContext(String),

    /// Deployment platform API failure.
    #[error("platform error: {0}")]
    #[diagnostic(code(revapp::platform))]
    Platform(String),

    /// Source-hosting API failure.
    #[error("source host error: {0}")]
    #[diagnostic(code(revapp::source_host))]
    SourceHost(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ReviewAppError {
    /// Whether the error came from one of the remote APIs.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Platform(_) | Self::SourceHost(_))
    }
}
