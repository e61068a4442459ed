//! `generateContent` request building and response mapping.

use super::types::{
    Content, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineData, Part, PrebuiltVoiceConfig, SpeechConfig, Tool, VoiceConfig,
};
use crate::media::MediaReference;
use crate::models::{
    ChatRole, GenerationRequest, GenerationResponse, Modality, PromptPart, ResponsePart,
};
use crate::{Error, Result};

fn to_part(part: &PromptPart) -> Part {
    match part {
        PromptPart::Text(text) => Part::Text {
            text: text.clone(),
            thought: None,
        },
        PromptPart::Media(media) => Part::InlineData {
            inline_data: InlineData {
                mime_type: media.mime_type.clone(),
                data: media.data.clone(),
            },
        },
    }
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part::Text {
            text: text.to_string(),
            thought: None,
        }],
    }
}

fn modality_name(modality: Modality) -> String {
    match modality {
        Modality::Text => "TEXT",
        Modality::Audio => "AUDIO",
        Modality::Image => "IMAGE",
    }
    .to_string()
}

pub(crate) fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            };
            text_content(Some(role), &turn.content)
        })
        .collect();

    contents.push(Content {
        role: Some("user".to_string()),
        parts: request.parts.iter().map(to_part).collect(),
    });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![Tool {
            function_declarations: request
                .tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    };

    let model = &request.model;
    let generation_config = GenerationConfig {
        response_mime_type: request
            .output_schema
            .as_ref()
            .map(|_| "application/json".to_string()),
        response_schema: request.output_schema.clone(),
        response_modalities: model
            .response_modalities
            .iter()
            .copied()
            .map(modality_name)
            .collect(),
        speech_config: model.voice.as_ref().map(|voice| SpeechConfig {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice.clone(),
                },
            },
        }),
    };
    let has_config = generation_config.response_mime_type.is_some()
        || !generation_config.response_modalities.is_empty()
        || generation_config.speech_config.is_some();

    GenerateContentRequest {
        contents,
        system_instruction: request.system.as_deref().map(|s| text_content(None, s)),
        tools,
        generation_config: has_config.then_some(generation_config),
    }
}

pub(crate) fn map_response(response: GenerateContentResponse) -> Result<GenerationResponse> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Generation(format!("prompt blocked: {}", reason)));
        }
        return Err(Error::EmptyResult("Gemini returned no candidates".to_string()));
    };

    let parts: Vec<ResponsePart> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { thought: Some(true), .. } => None,
            Part::Text { text, .. } => Some(ResponsePart::Text(text)),
            Part::InlineData { inline_data } => Some(ResponsePart::Media(MediaReference {
                mime_type: inline_data.mime_type,
                data: inline_data.data,
            })),
            Part::FunctionCall { function_call } => Some(ResponsePart::FunctionCall {
                name: function_call.name,
                args: function_call.args,
            }),
            Part::Other(value) => {
                tracing::debug!("Ignoring unsupported Gemini part: {}", value);
                None
            }
        })
        .collect();

    if parts.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| !matches!(r.as_str(), "STOP" | "MAX_TOKENS"))
        {
            return Err(Error::Generation(format!("response blocked: {}", reason)));
        }
    }

    Ok(GenerationResponse { parts })
}
