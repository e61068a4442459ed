//! Gemini implementation of [`GenerationService`].

pub mod client;
mod content;
pub mod types;
mod video;

pub use client::GeminiHttpClient;

use super::GenerationService;
use crate::models::{GenerationRequest, GenerationResponse, OperationHandle};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use types::{GenerateContentResponse, Operation};

pub struct GeminiClient {
    http: GeminiHttpClient,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let body = content::build_request(request);
        let path = format!(
            "{}:generateContent",
            GeminiHttpClient::model_path(&request.model.name)
        );
        tracing::debug!(
            "Sending generateContent to {} ({} parts, schema: {})",
            request.model.name,
            request.parts.len(),
            request.output_schema.is_some()
        );

        let response: GenerateContentResponse = self.http.post(&path, &body).await?;
        content::map_response(response)
    }

    async fn start_operation(&self, request: &GenerationRequest) -> Result<OperationHandle> {
        let body = video::build_request(request)?;
        let path = format!(
            "{}:predictLongRunning",
            GeminiHttpClient::model_path(&request.model.name)
        );

        let operation: Operation = self.http.post(&path, &body).await?;
        tracing::info!("Started Gemini operation {}", operation.name);
        Ok(video::map_operation(operation))
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationHandle> {
        let operation: Operation = self.http.get(&handle.name).await?;
        Ok(video::map_operation(operation))
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let bytes = self.http.get_bytes(uri).await?;
        tracing::debug!("Downloaded {} bytes from Gemini file storage", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::MockBuilder;

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";
    pub const PREDICT_LONG_RUNNING_PATH_REGEX: &str =
        r"^/v1beta/models/[^/]+:predictLongRunning$";

    pub fn post_path_regex(regex: &str) -> MockBuilder {
        wiremock::Mock::given(method("POST")).and(path_regex(regex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaReference;
    use crate::models::{GeneratedMedia, ModelConfig, PromptPart};
    use crate::Error;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri())
    }

    fn text_request(model: &str) -> GenerationRequest {
        GenerationRequest::new(ModelConfig::named(model), vec![PromptPart::text("hello")])
    }

    #[tokio::test]
    async fn test_generate_parses_text() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Hello from Gemini" }] }
                }]
            })))
            .mount(&server)
            .await;

        let response = make_client(&server)
            .generate(&text_request("gemini-2.5-flash"))
            .await
            .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello from Gemini"));
    }

    #[tokio::test]
    async fn test_generate_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .generate(&text_request("models/gemini-2.5-pro"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_generation_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate(&text_request("gemini-2.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_generate_returns_inline_audio() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("\"responseModalities\":[\"AUDIO\"]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{
                        "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAAA" }
                    }]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = text_request("gemini-2.5-flash-preview-tts");
        request.model.response_modalities = vec![crate::models::Modality::Audio];
        let response = make_client(&server).generate(&request).await.unwrap();

        let audio = response.media("audio/").unwrap();
        assert_eq!(audio.decode().unwrap(), vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn test_video_operation_lifecycle() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::PREDICT_LONG_RUNNING_PATH_REGEX)
            .and(body_string_contains("\"bytesBase64Encoded\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "models/veo-2.0-generate-001/operations/op123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models/veo-2.0-generate-001/operations/op123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "models/veo-2.0-generate-001/operations/op123",
                "done": true,
                "response": { "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": format!("{}/files/v.mp4", server.uri()) } }]
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/v.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\0\0\0\x20ftypisom".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server);
        let request = GenerationRequest::new(
            ModelConfig::named("veo-2.0-generate-001"),
            vec![
                PromptPart::text("A sunrise"),
                PromptPart::Media(MediaReference {
                    mime_type: "image/png".to_string(),
                    data: "iVBORw==".to_string(),
                }),
            ],
        );

        let started = client.start_operation(&request).await.unwrap();
        assert!(!started.done);

        let finished = client.poll_operation(&started).await.unwrap();
        assert!(finished.done);
        let GeneratedMedia::Remote { uri, .. } = &finished.output[0] else {
            panic!("expected remote video");
        };

        let bytes = client.download(uri).await.unwrap();
        assert_eq!(&bytes[4..8], b"ftyp");
    }
}
