//! Conversational assistant with tool dispatch.
//!
//! The model sees the conversation, the new prompt, an optional attached file
//! and five tool declarations. When it answers with a function call, the call
//! is decoded into [`ToolInvocation`] and run against the attached file.

use super::speech::Voice;
use super::video::{AspectRatio, VideoArtifact, VideoOptions, DEFAULT_VIDEO_SECONDS};
use super::{chart, presentation, speech, summary, video, FlowContext};
use crate::audio::WavAudio;
use crate::contracts::{ChartAnalysis, DocumentSummary, Presentation};
use crate::media::MediaReference;
use crate::models::{ChatTurn, GenerationRequest, ModelConfig, PromptPart, ToolDeclaration};
use crate::prompts;
use crate::schema::Schema;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A tool call the assistant may make. Names and argument shapes match the
/// declarations sent with every chat request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "camelCase")]
pub enum ToolInvocation {
    CreatePresentation {},
    AnalyzeChart {},
    ConvertToSpeech {
        #[serde(default)]
        voice: Voice,
    },
    #[serde(rename_all = "camelCase")]
    CreateVideo {
        prompt: String,
        #[serde(default = "default_video_seconds")]
        duration_seconds: u32,
        #[serde(default)]
        aspect_ratio: AspectRatio,
    },
    SummarizeDocument {},
}

fn default_video_seconds() -> u32 {
    DEFAULT_VIDEO_SECONDS
}

impl ToolInvocation {
    /// Decode a function call returned by the model.
    pub fn from_call(name: &str, args: &serde_json::Value) -> Result<Self> {
        let args = if args.is_null() { json!({}) } else { args.clone() };
        serde_json::from_value(json!({ "name": name, "args": args })).map_err(|e| {
            Error::Generation(format!("model requested unusable tool call '{}': {}", name, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolInvocation::CreatePresentation {} => "createPresentation",
            ToolInvocation::AnalyzeChart {} => "analyzeChart",
            ToolInvocation::ConvertToSpeech { .. } => "convertToSpeech",
            ToolInvocation::CreateVideo { .. } => "createVideo",
            ToolInvocation::SummarizeDocument {} => "summarizeDocument",
        }
    }

    /// Declarations for every tool, in the model's schema dialect.
    pub fn declarations() -> Vec<ToolDeclaration> {
        vec![
            ToolDeclaration {
                name: "createPresentation".to_string(),
                description: "Create a PowerPoint presentation from the content of the attached \
                              document or image. The user must provide a file."
                    .to_string(),
                parameters: None,
            },
            ToolDeclaration {
                name: "analyzeChart".to_string(),
                description: "Analyze a chart or graph from the attached image or PDF. Extracts \
                              title, summary, and data into a table. The user must provide a file."
                    .to_string(),
                parameters: None,
            },
            ToolDeclaration {
                name: "convertToSpeech".to_string(),
                description: "Convert the text content of the attached document or image into \
                              speech and return the audio file. The user must provide a file."
                    .to_string(),
                parameters: Some(
                    Schema::object("Speech options.", vec![])
                        .with_optional("voice", Schema::string("Either 'male' or 'female'.")),
                ),
            },
            ToolDeclaration {
                name: "createVideo".to_string(),
                description: "Create an educational video from a text prompt and, when attached, \
                              the content of a document or image."
                    .to_string(),
                parameters: Some(
                    Schema::object(
                        "Video options.",
                        vec![("prompt", Schema::string("What the video should show."))],
                    )
                    .with_optional(
                        "durationSeconds",
                        Schema::integer("Length of the clip in seconds, 5 to 8. Defaults to 5."),
                    )
                    .with_optional(
                        "aspectRatio",
                        Schema::string("Either '16:9' or '9:16'. Defaults to '16:9'."),
                    ),
                ),
            },
            ToolDeclaration {
                name: "summarizeDocument".to_string(),
                description: "Summarize the content of the attached document or image. The user \
                              must provide a file."
                    .to_string(),
                parameters: None,
            },
        ]
    }
}

/// Result of running a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Presentation(Presentation),
    Chart(ChartAnalysis),
    Speech(WavAudio),
    Video(VideoArtifact),
    Summary(DocumentSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Text(String),
    Tool {
        invocation: ToolInvocation,
        output: ToolOutput,
    },
}

impl ChatReply {
    /// What to show the user: the assistant's answer, or a completion notice
    /// for a tool run.
    pub fn message(&self) -> String {
        let output = match self {
            ChatReply::Text(text) => return text.clone(),
            ChatReply::Tool { output, .. } => output,
        };
        let detail = match output {
            ToolOutput::Speech(_) | ToolOutput::Video(_) => {
                return "Task complete! The resulting file is ready to download.".to_string()
            }
            ToolOutput::Presentation(deck) => serde_json::to_string(deck),
            ToolOutput::Chart(analysis) => serde_json::to_string(analysis),
            ToolOutput::Summary(summary) => serde_json::to_string(summary),
        };
        match detail {
            Ok(detail) => format!("Task complete! Here is the result: {}", detail),
            Err(e) => {
                warn!("Failed to serialise tool result: {}", e);
                "Task complete!".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub history: Vec<ChatTurn>,
    pub prompt: String,
    pub file: Option<MediaReference>,
}

/// One assistant turn.
pub async fn chat(
    ctx: &FlowContext,
    input: &ChatInput,
    cancel: &CancellationToken,
) -> Result<ChatReply> {
    if input.prompt.trim().is_empty() {
        return Err(Error::InvalidInput("chat prompt cannot be empty".to_string()));
    }

    let mut parts = vec![PromptPart::text(input.prompt.trim())];
    if let Some(file) = &input.file {
        parts.push(PromptPart::Media(file.clone()));
    }
    let request = GenerationRequest::new(ModelConfig::named(&ctx.models().chat), parts)
        .with_system(prompts::render(prompts::CHAT_SYSTEM, &[]))
        .with_history(input.history.clone())
        .with_tools(ToolInvocation::declarations());

    info!(
        "Chat turn ({} prior turns, file: {})",
        input.history.len(),
        input.file.is_some()
    );
    let response = ctx.generate(&request, cancel).await?;

    if let Some((name, args)) = response.function_call() {
        let invocation = ToolInvocation::from_call(name, args)?;
        info!("Assistant requested tool {}", invocation.name());
        let output = run_tool(ctx, &invocation, input.file.as_ref(), cancel).await?;
        return Ok(ChatReply::Tool { invocation, output });
    }

    let text = response.text().unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(Error::EmptyResult("the assistant returned no answer".to_string()));
    }
    Ok(ChatReply::Text(text))
}

/// Run `invocation` against the attached file.
pub async fn run_tool(
    ctx: &FlowContext,
    invocation: &ToolInvocation,
    file: Option<&MediaReference>,
    cancel: &CancellationToken,
) -> Result<ToolOutput> {
    let require_file = || {
        file.ok_or_else(|| {
            Error::InvalidInput(format!(
                "the {} tool needs an attached file",
                invocation.name()
            ))
        })
    };

    let output = match invocation {
        ToolInvocation::CreatePresentation {} => ToolOutput::Presentation(
            presentation::create_presentation(ctx, require_file()?, cancel).await?,
        ),
        ToolInvocation::AnalyzeChart {} => {
            ToolOutput::Chart(chart::analyze_chart(ctx, require_file()?, cancel).await?)
        }
        ToolInvocation::ConvertToSpeech { voice } => ToolOutput::Speech(
            speech::document_to_speech(ctx, require_file()?, *voice, cancel).await?,
        ),
        ToolInvocation::CreateVideo {
            prompt,
            duration_seconds,
            aspect_ratio,
        } => {
            let options = VideoOptions {
                prompt: prompt.clone(),
                file: file.cloned(),
                duration_seconds: *duration_seconds,
                aspect_ratio: *aspect_ratio,
            };
            ToolOutput::Video(video::generate_video(ctx, &options, cancel).await?)
        }
        ToolInvocation::SummarizeDocument {} => {
            ToolOutput::Summary(summary::summarize_document(ctx, require_file()?, cancel).await?)
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::flows::test_support::{context, pdf};
    use crate::models::{ChatRole, GenerationResponse, ResponsePart};
    use pretty_assertions::assert_eq;

    fn function_call(name: &str, args: serde_json::Value) -> GenerationResponse {
        GenerationResponse {
            parts: vec![ResponsePart::FunctionCall {
                name: name.to_string(),
                args,
            }],
        }
    }

    #[test]
    fn test_decode_tool_calls() {
        assert_eq!(
            ToolInvocation::from_call("analyzeChart", &json!({})).unwrap(),
            ToolInvocation::AnalyzeChart {}
        );
        assert_eq!(
            ToolInvocation::from_call("summarizeDocument", &serde_json::Value::Null).unwrap(),
            ToolInvocation::SummarizeDocument {}
        );
        assert_eq!(
            ToolInvocation::from_call("convertToSpeech", &json!({ "voice": "male" })).unwrap(),
            ToolInvocation::ConvertToSpeech { voice: Voice::Male }
        );
        assert_eq!(
            ToolInvocation::from_call("createVideo", &json!({ "prompt": "waves" })).unwrap(),
            ToolInvocation::CreateVideo {
                prompt: "waves".to_string(),
                duration_seconds: 5,
                aspect_ratio: AspectRatio::Landscape,
            }
        );
        assert_eq!(
            ToolInvocation::from_call(
                "createVideo",
                &json!({ "prompt": "waves", "durationSeconds": 8, "aspectRatio": "9:16" })
            )
            .unwrap(),
            ToolInvocation::CreateVideo {
                prompt: "waves".to_string(),
                duration_seconds: 8,
                aspect_ratio: AspectRatio::Portrait,
            }
        );
    }

    #[test]
    fn test_unknown_tool_is_generation_error() {
        let err = ToolInvocation::from_call("deleteEverything", &json!({})).unwrap_err();
        assert!(matches!(err, Error::Generation(ref m) if m.contains("deleteEverything")));
    }

    #[test]
    fn test_declarations_cover_every_tool() {
        let names: Vec<String> = ToolInvocation::declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "createPresentation",
                "analyzeChart",
                "convertToSpeech",
                "createVideo",
                "summarizeDocument"
            ]
        );
    }

    #[tokio::test]
    async fn test_plain_answer_with_history() {
        let mock = MockGenerationClient::new().with_text_response("Ownership means one owner.");
        let ctx = context(&mock);
        let input = ChatInput {
            history: vec![ChatTurn {
                role: ChatRole::User,
                content: "Hi".to_string(),
            }],
            prompt: "Explain ownership".to_string(),
            file: None,
        };

        let reply = chat(&ctx, &input, &CancellationToken::new()).await.unwrap();
        assert_eq!(reply, ChatReply::Text("Ownership means one owner.".to_string()));
        assert_eq!(reply.message(), "Ownership means one owner.");

        let request = &mock.requests()[0];
        assert_eq!(request.model.name, "gemini-2.5-pro");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.tools.len(), 5);
        assert!(request.system.as_deref().unwrap().starts_with("You are Mahmoud.AI"));
    }

    #[tokio::test]
    async fn test_tool_call_runs_against_attached_file() {
        let mock = MockGenerationClient::new()
            .with_response(function_call("summarizeDocument", json!({})))
            .with_text_response("{\"summary\": \"It is about Rust.\"}");
        let ctx = context(&mock);
        let input = ChatInput {
            prompt: "Summarize this".to_string(),
            file: Some(pdf()),
            ..ChatInput::default()
        };

        let reply = chat(&ctx, &input, &CancellationToken::new()).await.unwrap();
        assert_eq!(
            reply,
            ChatReply::Tool {
                invocation: ToolInvocation::SummarizeDocument {},
                output: ToolOutput::Summary(DocumentSummary {
                    summary: "It is about Rust.".to_string()
                }),
            }
        );
        assert!(reply.message().starts_with("Task complete! Here is the result:"));

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].media().next(), Some(&pdf()));
    }

    #[tokio::test]
    async fn test_file_tool_without_file_is_invalid_input() {
        let mock =
            MockGenerationClient::new().with_response(function_call("analyzeChart", json!({})));
        let ctx = context(&mock);
        let input = ChatInput {
            prompt: "Analyze the chart".to_string(),
            ..ChatInput::default()
        };

        let err = chat(&ctx, &input, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("analyzeChart")));
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let mock = MockGenerationClient::new();
        let ctx = context(&mock);

        let err = chat(&ctx, &ChatInput::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
