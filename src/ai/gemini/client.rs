use crate::{Error, Result};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST transport shared by content, TTS and video calls.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `models/<id>` path segment for a model name given with or without the
    /// `models/` prefix.
    pub fn model_path(model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("models/{}", model)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response.text().await?;
        tracing::error!("Gemini API error (status {}): {}", status, error_text);
        Err(Error::Generation(format!(
            "Gemini API error (status {}): {}",
            status, error_text
        )))
    }

    async fn parse_body<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Generation(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// POST `request` as JSON to `{base}/v1beta/{path}`.
    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}/v1beta/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        Self::parse_body(Self::check_status(response).await?).await
    }

    /// GET JSON from `{base}/v1beta/{path}`.
    pub async fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        let url = format!("{}/v1beta/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to poll Gemini: {}", e);
                e
            })?;

        Self::parse_body(Self::check_status(response).await?).await
    }

    /// True when `uri` has the same scheme, host and port as the base URL.
    fn is_api_origin(&self, uri: &str) -> bool {
        match (Url::parse(uri), Url::parse(&self.base_url)) {
            (Ok(target), Ok(base)) => {
                target.scheme() == base.scheme()
                    && target.host_str() == base.host_str()
                    && target.port_or_known_default() == base.port_or_known_default()
            }
            _ => false,
        }
    }

    /// Download an absolute URI. The API key is attached only for URIs on the
    /// API's own origin.
    pub async fn get_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(uri).timeout(self.timeout);
        if self.is_api_origin(uri) {
            request = request.header("x-goog-api-key", &self.api_key);
        } else {
            tracing::warn!("Downloading {} without credentials: not the API origin", uri);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to download Gemini file: {}", e);
                e
            })?;

        let bytes = Self::check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
