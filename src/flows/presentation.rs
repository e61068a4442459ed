use super::{DocumentPrompt, FlowContext};
use crate::contracts::Presentation;
use crate::media::MediaReference;
use crate::prompts;
use crate::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Slide-deck outline of a document: a title plus titled slides of bullet
/// points. Rendering the deck is left to the caller.
pub async fn create_presentation(
    ctx: &FlowContext,
    file: &MediaReference,
    cancel: &CancellationToken,
) -> Result<Presentation> {
    info!("Creating presentation ({})", file.mime_type);

    let deck: Presentation = ctx
        .generate_structured(
            DocumentPrompt {
                model: &ctx.models().fast,
                system: prompts::PRESENTATION_SYSTEM,
                instructions: prompts::render(prompts::PRESENTATION_USER, &[]),
                file,
                schema: None,
            },
            cancel,
        )
        .await?;

    info!("Presentation '{}' has {} slides", deck.title, deck.slides.len());
    Ok(deck)
}
