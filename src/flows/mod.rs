//! Feature flows
//!
//! Each flow turns caller input (usually one encoded file) into a validated
//! result by driving the injected [`GenerationService`]. Flows share the
//! [`FlowContext`] and never hold state between invocations.

pub mod chart;
pub mod chat;
pub mod mind_map;
pub mod presentation;
pub mod questions;
pub mod speech;
pub mod summary;
pub mod transcribe;
pub mod video;

use crate::ai::{GenerationService, OperationPoller};
use crate::media::MediaReference;
use crate::models::{GenerationRequest, GenerationResponse, ModelConfig, ModelSet, PromptPart};
use crate::prompts;
use crate::schema::{parse_structured, Schema, StructuredOutput};
use crate::{Error, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything a flow needs from its environment.
#[derive(Clone)]
pub struct FlowContext {
    generator: Arc<dyn GenerationService>,
    models: ModelSet,
    poller: OperationPoller,
}

impl FlowContext {
    pub fn new(
        generator: Arc<dyn GenerationService>,
        models: ModelSet,
        poller: OperationPoller,
    ) -> Self {
        Self {
            generator,
            models,
            poller,
        }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn poller(&self) -> &OperationPoller {
        &self.poller
    }

    pub fn generator(&self) -> &dyn GenerationService {
        self.generator.as_ref()
    }

    /// One generation call, abandoned as soon as `cancel` fires.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            response = self.generator.generate(request) => response,
        }
    }

    /// Generate and return the trimmed text of the response. Missing text
    /// comes back as an empty string; callers decide whether that is fatal.
    pub async fn generate_text(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response = self.generate(request, cancel).await?;
        Ok(response.text().unwrap_or_default().trim().to_string())
    }

    /// Ask for `T` about `file` and return it once parsed and validated.
    pub async fn generate_structured<T: StructuredOutput>(
        &self,
        document: DocumentPrompt<'_>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let schema = document.schema.unwrap_or_else(T::schema);
        let request = GenerationRequest::new(
            ModelConfig::named(document.model),
            vec![
                PromptPart::text(document.instructions),
                PromptPart::Media(document.file.clone()),
            ],
        )
        .with_system(prompts::render(document.system, &[]))
        .with_schema(schema);

        let text = self.generate_text(&request, cancel).await?;
        debug!("{} response: {} chars", T::NAME, text.len());
        parse_structured(&text)
    }
}

/// A structured request about one attached file.
pub struct DocumentPrompt<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub instructions: String,
    pub file: &'a MediaReference,
    /// Overrides the result type's default schema.
    pub schema: Option<Schema>,
}

/// Pull the plain text out of a document or image with `model`.
///
/// An empty extraction is [`Error::EmptyResult`].
pub(crate) async fn extract_text(
    ctx: &FlowContext,
    model: &str,
    file: &MediaReference,
    cancel: &CancellationToken,
) -> Result<String> {
    let request = GenerationRequest::new(
        ModelConfig::named(model),
        vec![
            PromptPart::text(prompts::render(prompts::EXTRACT_TEXT, &[])),
            PromptPart::Media(file.clone()),
        ],
    );
    let text = ctx.generate_text(&request, cancel).await?;
    if text.is_empty() {
        return Err(Error::EmptyResult(
            "could not extract text from the document".to_string(),
        ));
    }
    debug!("Extracted {} chars of text from {}", text.len(), file.mime_type);
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::contracts::DocumentSummary;

    #[tokio::test]
    async fn test_generate_structured_attaches_file_and_schema() {
        let mock = MockGenerationClient::new().with_text_response("{\"summary\": \"Short.\"}");
        let ctx = context(&mock);
        let file = pdf();

        let summary: DocumentSummary = ctx
            .generate_structured(
                DocumentPrompt {
                    model: "gemini-2.5-pro",
                    system: "system\n",
                    instructions: "summarize".to_string(),
                    file: &file,
                    schema: None,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(summary.summary, "Short.");

        let request = &mock.requests()[0];
        assert_eq!(request.model.name, "gemini-2.5-pro");
        assert_eq!(request.system.as_deref(), Some("system"));
        assert_eq!(request.output_schema, Some(DocumentSummary::schema()));
        assert_eq!(request.media().next(), Some(&file));
    }

    #[tokio::test]
    async fn test_generate_respects_cancellation() {
        let mock = MockGenerationClient::new().with_text_response("ignored");
        let ctx = context(&mock);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = GenerationRequest::new(ModelConfig::named("m"), vec![PromptPart::text("x")]);
        let err = ctx.generate(&request, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_extraction_is_empty_result() {
        let mock = MockGenerationClient::new().with_text_response("   ");
        let ctx = context(&mock);

        let err = extract_text(&ctx, "gemini-2.5-flash", &pdf(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
    }
}
