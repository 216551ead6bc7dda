use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, RANGE, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use revapp_core::{PlatformConfig, Result, ReviewAppError};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::platform::PlatformApi;
use crate::types::{App, NewReviewApp, ReviewApp};

const ACCEPT_V3: &str = "application/vnd.heroku+json; version=3";
const NEXT_RANGE: &str = "Next-Range";

/// Heroku Platform API client.
///
/// List endpoints follow Heroku's range pagination: a `206 Partial Content`
/// response carrying `Next-Range` is re-requested with that value as the
/// `Range` header until the last page.
///
/// # Examples
///
/// ```
/// use revapp_deploy::HerokuClient;
///
/// let client = HerokuClient::new("https://api.heroku.com/", "token").unwrap();
/// assert_eq!(client.base_url(), "https://api.heroku.com");
/// ```
pub struct HerokuClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct HerokuErrorBody {
    id: Option<String>,
    message: Option<String>,
}

impl HerokuClient {
    /// Create a client for the API at `base_url` authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Platform`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::build(base_url, token, Duration::from_secs(30))
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewAppError::Platform`] if the HTTP client cannot be built.
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        Self::build(&config.base_url, &config.api_token, config.timeout)
    }

    fn build(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewAppError::Platform(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!("{method} {url}");
        self.http
            .request(method, url)
            .header(ACCEPT, ACCEPT_V3)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(USER_AGENT, "revapp")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| ReviewAppError::Platform(format!("request failed: {e}")))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewAppError::Platform(describe_failure(status, &body)));
        }

        response
            .json()
            .await
            .map_err(|e| ReviewAppError::Platform(format!("failed to parse response: {e}")))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<HerokuErrorBody>(body) {
        Ok(HerokuErrorBody {
            id: Some(id),
            message: Some(message),
        }) => format!("Heroku API error {status} ({id}): {message}"),
        _ => format!("Heroku API error {status}: {body}"),
    }
}

#[async_trait]
impl PlatformApi for HerokuClient {
    async fn create_review_app(&self, body: &NewReviewApp) -> Result<ReviewApp> {
        self.call(self.request(Method::POST, "/review-apps").json(body))
            .await
    }

    async fn get_review_app(&self, id: &str) -> Result<ReviewApp> {
        self.call(self.request(Method::GET, &format!("/review-apps/{id}")))
            .await
    }

    async fn list_review_apps(&self, pipeline: &str) -> Result<Vec<ReviewApp>> {
        let path = format!("/pipelines/{pipeline}/review-apps");
        let mut review_apps = Vec::new();
        let mut range: Option<String> = None;

        loop {
            let mut request = self.request(Method::GET, &path);
            if let Some(range) = &range {
                request = request.header(RANGE, range.as_str());
            }

            let response = self.send(request).await?;
            let status = response.status();
            let next_range = response
                .headers()
                .get(NEXT_RANGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let page: Vec<ReviewApp> = Self::decode(response).await?;
            debug!("fetched {} review apps (status {status})", page.len());
            review_apps.extend(page);

            match next_range {
                Some(next) if status == StatusCode::PARTIAL_CONTENT => range = Some(next),
                _ => break,
            }
        }

        Ok(review_apps)
    }

    async fn delete_review_app(&self, id: &str) -> Result<ReviewApp> {
        self.call(self.request(Method::DELETE, &format!("/review-apps/{id}")))
            .await
    }

    async fn get_app(&self, id: &str) -> Result<App> {
        self.call(self.request(Method::GET, &format!("/apps/{id}")))
            .await
    }
}
