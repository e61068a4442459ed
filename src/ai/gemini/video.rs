//! Veo video generation through `predictLongRunning`.

use super::types::{
    Operation, PredictLongRunningRequest, VideoImage, VideoInstance, VideoParameters,
};
use crate::media::{MediaKind, MediaReference};
use crate::models::{
    GeneratedMedia, GenerationRequest, OperationError, OperationHandle, PromptPart,
};
use crate::{Error, Result};

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

pub(crate) fn build_request(request: &GenerationRequest) -> Result<PredictLongRunningRequest> {
    let prompt = request
        .parts
        .iter()
        .filter_map(|p| match p {
            PromptPart::Text(t) => Some(t.as_str()),
            PromptPart::Media(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    if prompt.trim().is_empty() {
        return Err(Error::InvalidInput("video prompt is empty".to_string()));
    }

    let mut images = request.media();
    let image = match images.next() {
        None => None,
        Some(media) if media.kind() == MediaKind::Image => Some(VideoImage {
            bytes_base64_encoded: media.data.clone(),
            mime_type: media.mime_type.clone(),
        }),
        Some(media) => {
            return Err(Error::InvalidInput(format!(
                "video generation accepts an image reference, got {}",
                media.mime_type
            )))
        }
    };
    if images.next().is_some() {
        return Err(Error::InvalidInput(
            "video generation accepts at most one image".to_string(),
        ));
    }

    let model = &request.model;
    Ok(PredictLongRunningRequest {
        instances: vec![VideoInstance { prompt, image }],
        parameters: VideoParameters {
            aspect_ratio: model.aspect_ratio.clone(),
            duration_seconds: model.duration_seconds,
            person_generation: model.person_generation.clone(),
            sample_count: 1,
        },
    })
}

pub(crate) fn map_operation(operation: Operation) -> OperationHandle {
    let mut error = operation.error.map(|status| OperationError {
        code: status.code,
        message: status.message,
    });

    let mut output = Vec::new();
    if let Some(video) = operation
        .response
        .and_then(|r| r.generate_video_response)
    {
        for sample in video.generated_samples {
            let mime_type = sample
                .video
                .mime_type
                .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());
            if let Some(data) = sample.video.bytes_base64_encoded {
                output.push(GeneratedMedia::Inline(MediaReference { mime_type, data }));
            } else if let Some(uri) = sample.video.uri {
                output.push(GeneratedMedia::Remote { uri, mime_type });
            }
        }

        if output.is_empty() && error.is_none() && !video.rai_media_filtered_reasons.is_empty() {
            error = Some(OperationError {
                code: None,
                message: format!(
                    "video was filtered: {}",
                    video.rai_media_filtered_reasons.join("; ")
                ),
            });
        }
    }

    OperationHandle {
        name: operation.name,
        done: operation.done,
        error,
        output,
    }
}
