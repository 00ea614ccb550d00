//! HTTP client implementation

use std::time::Duration;

use api_models::models::ErrorResponse;
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::LauncherError;

/// HTTP client for the deployment service
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client
    ///
    /// `base_url` is the API root, e.g. `http://127.0.0.1:8000/api/`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LauncherError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LauncherError::ConfigError(format!(
                "Backend URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| LauncherError::ConfigError(format!("Invalid backend URL: {}", e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LauncherError::ConfigError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments
    ///
    /// Segments are percent-encoded and the path always ends with '/', which
    /// the service's routes require.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, LauncherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LauncherError::ConfigError(format!("Backend URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, LauncherError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_json(response, "GET").await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, LauncherError> {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        Self::read_json(response, "POST").await
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        method: &str,
    ) -> Result<T, LauncherError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(LauncherError::RequestFailed {
                status: status.as_u16(),
                detail: failure_detail(&body, status.canonical_reason()),
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Extract a readable detail from a failure body
fn failure_detail(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(detail) = parsed.detail() {
            return detail.to_string();
        }
    }

    let trimmed = body.trim();
    if is_presentable(trimmed) {
        trimmed.to_string()
    } else {
        reason.unwrap_or("Unknown error").to_string()
    }
}

/// Longest raw body passed through as a failure detail
const MAX_RAW_DETAIL_CHARS: usize = 200;

/// Short single-line plain text; HTML pages and tracebacks are not
fn is_presentable(body: &str) -> bool {
    !body.is_empty()
        && !body.starts_with('<')
        && !body.contains('\n')
        && body.chars().count() <= MAX_RAW_DETAIL_CHARS
}
