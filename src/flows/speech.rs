//! Document and text to speech.
//!
//! The TTS model answers with raw 16-bit PCM, which is wrapped into a WAV
//! container before it leaves this module.

use super::{extract_text, FlowContext};
use crate::audio::{WavAudio, WavSpec};
use crate::media::MediaReference;
use crate::models::{GenerationRequest, Modality, ModelConfig, PromptPart};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Male,
    #[default]
    Female,
}

impl Voice {
    /// Prebuilt voice for this gender in Arabic or English.
    pub fn voice_name(self, arabic: bool) -> &'static str {
        match (arabic, self) {
            (true, Voice::Male) => "ar-XA-Standard-B",
            (true, Voice::Female) => "ar-XA-Standard-A",
            (false, Voice::Male) => "en-US-Standard-D",
            (false, Voice::Female) => "en-US-Standard-E",
        }
    }
}

impl FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Voice::Male),
            "female" => Ok(Voice::Female),
            other => Err(Error::InvalidInput(format!("unknown voice '{}'", other))),
        }
    }
}

/// True when `text` contains any character of the Arabic block.
pub fn is_arabic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

/// Read a document aloud: extract its text, then synthesise it.
pub async fn document_to_speech(
    ctx: &FlowContext,
    file: &MediaReference,
    voice: Voice,
    cancel: &CancellationToken,
) -> Result<WavAudio> {
    info!("Converting document to speech ({}, {:?})", file.mime_type, voice);
    let text = extract_text(ctx, &ctx.models().analysis, file, cancel).await?;
    synthesize(ctx, &text, voice, cancel).await
}

/// Speak caller-supplied text with the female voice.
pub async fn text_to_speech(
    ctx: &FlowContext,
    text: &str,
    cancel: &CancellationToken,
) -> Result<WavAudio> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("input text cannot be empty".to_string()));
    }
    info!("Converting {} chars of text to speech", text.len());
    synthesize(ctx, text, Voice::Female, cancel).await
}

async fn synthesize(
    ctx: &FlowContext,
    text: &str,
    voice: Voice,
    cancel: &CancellationToken,
) -> Result<WavAudio> {
    let voice_name = voice.voice_name(is_arabic(text));
    let mut model = ModelConfig::named(&ctx.models().tts);
    model.response_modalities = vec![Modality::Audio];
    model.voice = Some(voice_name.to_string());

    let request = GenerationRequest::new(model, vec![PromptPart::text(text)]);
    let response = ctx.generate(&request, cancel).await?;

    let media = response
        .media("audio/")
        .ok_or_else(|| Error::EmptyResult("no audio returned from the speech model".to_string()))?;
    let pcm = media.decode()?;
    if pcm.is_empty() {
        return Err(Error::EmptyResult("speech model returned empty audio".to_string()));
    }

    let spec = WavSpec::from_mime(&media.mime_type);
    debug!(
        "Received {} bytes of PCM ({}, voice {})",
        pcm.len(),
        media.mime_type,
        voice_name
    );

    let wav = WavAudio::from_pcm(&pcm, spec)?;
    info!(
        "Speech ready: {} bytes, {:.1}s",
        wav.bytes.len(),
        wav.duration_secs().unwrap_or_default()
    );
    Ok(wav)
}
