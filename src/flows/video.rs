//! Video generation.
//!
//! Video is produced by a long-running operation: the job is submitted,
//! polled until finished, and the resulting clip fetched.

use super::{extract_text, FlowContext};
use crate::ai::poller::extract_media;
use crate::media::{MediaKind, MediaReference};
use crate::models::{GeneratedMedia, GenerationRequest, ModelConfig, PromptPart};
use crate::prompts;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_retry::{strategy::FixedInterval, Retry};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const DEFAULT_VIDEO_SECONDS: u32 = 5;
pub const MIN_VIDEO_SECONDS: u32 = 5;
pub const MAX_VIDEO_SECONDS: u32 = 8;

const PERSON_GENERATION: &str = "allow_adult";
const DOWNLOAD_RETRY_INTERVAL_MS: u64 = 2000;
const DOWNLOAD_RETRIES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(Error::InvalidInput(format!(
                "aspect ratio must be 16:9 or 9:16, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoOptions {
    pub prompt: String,
    /// Image to animate, or a document whose text the video should be based on.
    pub file: Option<MediaReference>,
    pub duration_seconds: u32,
    pub aspect_ratio: AspectRatio,
}

impl VideoOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            file: None,
            duration_seconds: DEFAULT_VIDEO_SECONDS,
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn with_file(mut self, file: MediaReference) -> Self {
        self.file = Some(file);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::InvalidInput("video prompt cannot be empty".to_string()));
        }
        if !(MIN_VIDEO_SECONDS..=MAX_VIDEO_SECONDS).contains(&self.duration_seconds) {
            return Err(Error::InvalidInput(format!(
                "video duration must be {}-{} seconds, got {}",
                MIN_VIDEO_SECONDS, MAX_VIDEO_SECONDS, self.duration_seconds
            )));
        }
        Ok(())
    }
}

/// A finished clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl VideoArtifact {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Generate a short clip from a prompt, optionally grounded in a file.
///
/// Images are sent along as the first frame. Any other file has its text
/// extracted first and folded into the prompt.
pub async fn generate_video(
    ctx: &FlowContext,
    options: &VideoOptions,
    cancel: &CancellationToken,
) -> Result<VideoArtifact> {
    options.validate()?;
    info!(
        "Generating {}s {} video",
        options.duration_seconds, options.aspect_ratio
    );

    let parts = match &options.file {
        Some(file) if file.kind() == MediaKind::Image => vec![
            PromptPart::text(options.prompt.trim()),
            PromptPart::Media(file.clone()),
        ],
        Some(file) => {
            let text = extract_text(ctx, &ctx.models().fast, file, cancel).await?;
            vec![PromptPart::text(prompts::render(
                prompts::VIDEO_FROM_TEXT,
                &[("prompt", options.prompt.trim()), ("text", text.as_str())],
            ))]
        }
        None => vec![PromptPart::text(options.prompt.trim())],
    };

    let mut model = ModelConfig::named(&ctx.models().video);
    model.duration_seconds = Some(options.duration_seconds);
    model.aspect_ratio = Some(options.aspect_ratio.as_str().to_string());
    model.person_generation = Some(PERSON_GENERATION.to_string());
    let request = GenerationRequest::new(model, parts);

    let handle = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        handle = ctx.generator().start_operation(&request) => handle?,
    };
    info!("Video operation {} started", handle.name);

    let handle = ctx.poller().wait(ctx.generator(), handle, cancel).await?;
    let video = extract_media(&handle, "video/")?;

    let artifact = match video {
        GeneratedMedia::Inline(media) => VideoArtifact {
            mime_type: media.mime_type.clone(),
            bytes: media.decode()?,
        },
        GeneratedMedia::Remote { uri, mime_type } => VideoArtifact {
            mime_type: mime_type.clone(),
            bytes: download_with_retry(ctx, uri, cancel).await?,
        },
    };

    if artifact.bytes.is_empty() {
        return Err(Error::EmptyResult("the generated video is empty".to_string()));
    }
    info!("Video ready: {} bytes", artifact.bytes.len());
    Ok(artifact)
}

async fn download_with_retry(
    ctx: &FlowContext,
    uri: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let retry_strategy =
        FixedInterval::from_millis(DOWNLOAD_RETRY_INTERVAL_MS).take(DOWNLOAD_RETRIES);
    let generator = ctx.generator();

    let download = Retry::spawn(retry_strategy, move || async move {
        generator.download(uri).await.map_err(|e| {
            warn!("Video download failed: {}. Will retry...", e);
            e
        })
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        bytes = download => bytes.map_err(|e| {
            error!("Failed to download video after retries: {}", e);
            e
        }),
    }
}
