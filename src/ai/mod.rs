//! Generation capability boundary
//!
//! Every flow talks to the hosted model through [`GenerationService`], which
//! is injected rather than reached through a global client so tests can swap
//! in [`MockGenerationClient`].

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod poller;

pub use gemini::GeminiClient;
pub use mock::MockGenerationClient;
pub use poller::OperationPoller;

use crate::models::{GenerationRequest, GenerationResponse, OperationHandle};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Single round-trip generation: text, structured JSON, or inline media.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Submit an asynchronous media job (video) and return its handle.
    async fn start_operation(&self, request: &GenerationRequest) -> Result<OperationHandle>;

    /// Re-read the status of an operation. Safe to repeat.
    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationHandle>;

    /// Fetch the bytes of a remote artifact produced by an operation.
    async fn download(&self, uri: &str) -> Result<Vec<u8>>;
}
