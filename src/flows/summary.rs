use super::{DocumentPrompt, FlowContext};
use crate::contracts::DocumentSummary;
use crate::media::MediaReference;
use crate::prompts;
use crate::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Concise summary of a document or image, in the document's own language.
pub async fn summarize_document(
    ctx: &FlowContext,
    file: &MediaReference,
    cancel: &CancellationToken,
) -> Result<DocumentSummary> {
    info!("Summarizing document ({})", file.mime_type);

    let summary: DocumentSummary = ctx
        .generate_structured(
            DocumentPrompt {
                model: &ctx.models().analysis,
                system: prompts::SUMMARY_SYSTEM,
                instructions: prompts::render(prompts::SUMMARY_USER, &[]),
                file,
                schema: None,
            },
            cancel,
        )
        .await?;

    info!("Summary ready: {} chars", summary.summary.len());
    Ok(summary)
}
