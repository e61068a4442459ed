use super::FlowContext;
use crate::contracts::Transcription;
use crate::media::{MediaKind, MediaReference};
use crate::models::{GenerationRequest, ModelConfig, PromptPart};
use crate::prompts;
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Input to speech-to-text. A recording takes precedence over text the
/// caller already has; with neither there is nothing to do.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionInput {
    pub audio: Option<MediaReference>,
    pub existing_text: Option<String>,
    /// Language for the transcript and summary. `None` mirrors the recording.
    pub language: Option<String>,
}

/// Transcribe a recording (when given) and summarise the transcript.
pub async fn transcribe_and_summarize(
    ctx: &FlowContext,
    input: &TranscriptionInput,
    cancel: &CancellationToken,
) -> Result<Transcription> {
    let language = prompts::language_clause(input.language.as_deref());

    let transcription = match &input.audio {
        Some(audio) => {
            if audio.kind() != MediaKind::Audio {
                return Err(Error::InvalidInput(format!(
                    "expected an audio recording, got {}",
                    audio.mime_type
                )));
            }
            info!("Transcribing recording ({})", audio.mime_type);
            let request = GenerationRequest::new(
                ModelConfig::named(&ctx.models().fast),
                vec![
                    PromptPart::text(prompts::render(
                        prompts::TRANSCRIBE,
                        &[("language", language.as_str())],
                    )),
                    PromptPart::Media(audio.clone()),
                ],
            );
            let text = ctx.generate_text(&request, cancel).await?;
            if text.is_empty() {
                return Err(Error::EmptyResult(
                    "no speech could be transcribed from the recording".to_string(),
                ));
            }
            text
        }
        None => input
            .existing_text
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    };

    if transcription.is_empty() {
        info!("Nothing to transcribe");
        return Ok(Transcription::default());
    }

    let request = GenerationRequest::new(
        ModelConfig::named(&ctx.models().fast),
        vec![PromptPart::text(prompts::render(
            prompts::TRANSCRIPT_SUMMARY_USER,
            &[("language", language.as_str()), ("text", transcription.as_str())],
        ))],
    )
    .with_system(prompts::render(prompts::TRANSCRIPT_SUMMARY_SYSTEM, &[]));
    let summary = ctx.generate_text(&request, cancel).await?;

    info!(
        "Transcript of {} chars summarised to {} chars",
        transcription.len(),
        summary.len()
    );
    Ok(Transcription {
        transcription,
        summary,
    })
}
