use super::GenerationService;
use crate::models::{GenerationRequest, GenerationResponse, OperationHandle};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the hosted model.
///
/// Each method cycles through its configured responses. Clones share state,
/// so a clone kept by a test can inspect calls made through another.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<GenerationResponse>>>,
    operations: Arc<Mutex<Vec<OperationHandle>>>,
    poll_responses: Arc<Mutex<Vec<OperationHandle>>>,
    downloads: Arc<Mutex<Vec<Vec<u8>>>>,
    download_failures: Arc<Mutex<usize>>,
    generation_error: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
    poll_count: Arc<Mutex<usize>>,
    download_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            poll_responses: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
            download_failures: Arc::new(Mutex::new(0)),
            generation_error: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            poll_count: Arc::new(Mutex::new(0)),
            download_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: GenerationResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_text_response(self, text: &str) -> Self {
        self.with_response(GenerationResponse::from_text(text))
    }

    pub fn with_operation(self, handle: OperationHandle) -> Self {
        self.operations.lock().unwrap().push(handle);
        self
    }

    pub fn with_poll_response(self, handle: OperationHandle) -> Self {
        self.poll_responses.lock().unwrap().push(handle);
        self
    }

    pub fn with_download(self, bytes: Vec<u8>) -> Self {
        self.downloads.lock().unwrap().push(bytes);
        self
    }

    /// Fail the next `count` downloads before serving configured bytes.
    pub fn with_failing_downloads(self, count: usize) -> Self {
        *self.download_failures.lock().unwrap() = count;
        self
    }

    /// Make every `generate` and `start_operation` call fail.
    pub fn with_generation_error(self, message: &str) -> Self {
        *self.generation_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Calls to `generate` and `start_operation`.
    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn poll_count(&self) -> usize {
        *self.poll_count.lock().unwrap()
    }

    pub fn download_count(&self) -> usize {
        *self.download_count.lock().unwrap()
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &GenerationRequest) -> Result<usize> {
        self.requests.lock().unwrap().push(request.clone());
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if let Some(message) = self.generation_error.lock().unwrap().clone() {
            return Err(Error::Generation(message));
        }
        Ok(*count)
    }

    fn cycle<T: Clone>(items: &Mutex<Vec<T>>, call: usize) -> Option<T> {
        let items = items.lock().unwrap();
        if items.is_empty() {
            None
        } else {
            Some(items[(call - 1) % items.len()].clone())
        }
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let call = self.record(request)?;
        Ok(Self::cycle(&self.responses, call).unwrap_or_default())
    }

    async fn start_operation(&self, request: &GenerationRequest) -> Result<OperationHandle> {
        let call = self.record(request)?;
        Ok(Self::cycle(&self.operations, call)
            .unwrap_or_else(|| OperationHandle::pending("operations/mock")))
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationHandle> {
        let call = {
            let mut count = self.poll_count.lock().unwrap();
            *count += 1;
            *count
        };
        Ok(Self::cycle(&self.poll_responses, call).unwrap_or_else(|| {
            OperationHandle::finished(&handle.name, Vec::new())
        }))
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let call = {
            let mut count = self.download_count.lock().unwrap();
            *count += 1;
            *count
        };
        {
            let mut failures = self.download_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::Generation(format!("mock download of {} failed", uri)));
            }
        }
        Self::cycle(&self.downloads, call)
            .ok_or_else(|| Error::Generation(format!("no mock download for {}", uri)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelConfig, PromptPart};

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest::new(ModelConfig::named("mock"), vec![PromptPart::text(text)])
    }

    #[tokio::test]
    async fn test_mock_default_response_is_empty() {
        let client = MockGenerationClient::new();
        let response = client.generate(&request("hi")).await.unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_mock_custom_responses_cycle() {
        let client = MockGenerationClient::new()
            .with_text_response("first")
            .with_text_response("second");

        let r1 = client.generate(&request("a")).await.unwrap();
        assert_eq!(r1.text().as_deref(), Some("first"));
        let r2 = client.generate(&request("b")).await.unwrap();
        assert_eq!(r2.text().as_deref(), Some("second"));
        // Should cycle back
        let r3 = client.generate(&request("c")).await.unwrap();
        assert_eq!(r3.text().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_mock_records_requests_across_clones() {
        let client = MockGenerationClient::new();
        let probe = client.clone();

        client.generate(&request("hello")).await.unwrap();

        assert_eq!(probe.get_call_count(), 1);
        assert_eq!(probe.requests()[0].parts, vec![PromptPart::text("hello")]);
    }

    #[tokio::test]
    async fn test_mock_generation_error() {
        let client = MockGenerationClient::new().with_generation_error("quota exceeded");
        let err = client.generate(&request("x")).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_download_failures_then_success() {
        let client = MockGenerationClient::new()
            .with_download(vec![1, 2])
            .with_failing_downloads(1);

        assert!(client.download("uri").await.is_err());
        assert_eq!(client.download("uri").await.unwrap(), vec![1, 2]);
        assert_eq!(client.download_count(), 2);
    }
}
