//! Application orchestration: load inputs, run one flow, save its results.

use crate::ai::{GeminiClient, GenerationService, OperationPoller};
use crate::audio::WavAudio;
use crate::flows::chat::{self, ChatInput, ChatReply, ToolOutput};
use crate::flows::questions::{self, QuestionOptions};
use crate::flows::speech::{self, Voice};
use crate::flows::transcribe::{self, TranscriptionInput};
use crate::flows::video::{self, AspectRatio, VideoArtifact, VideoOptions};
use crate::flows::{chart, mind_map, presentation, summary, FlowContext};
use crate::media::MediaReference;
use crate::models::{ChatTurn, Config, ModelSet};
use crate::Result;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// One unit of work requested from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Chat {
        prompt: String,
        file: Option<PathBuf>,
        /// JSON array of `{ "role": "user" | "model", "content": "..." }`.
        history: Option<PathBuf>,
    },
    Chart {
        file: PathBuf,
    },
    Summarize {
        file: PathBuf,
    },
    MindMap {
        file: PathBuf,
    },
    Questions {
        file: PathBuf,
        options: QuestionOptions,
    },
    Presentation {
        file: PathBuf,
    },
    Speak {
        file: PathBuf,
        voice: Voice,
    },
    Say {
        text: String,
    },
    Transcribe {
        audio: Option<PathBuf>,
        text: Option<String>,
        language: Option<String>,
    },
    Video {
        prompt: String,
        file: Option<PathBuf>,
        duration_seconds: u32,
        aspect_ratio: AspectRatio,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Chat { .. } => "chat",
            Task::Chart { .. } => "chart",
            Task::Summarize { .. } => "summary",
            Task::MindMap { .. } => "mind_map",
            Task::Questions { .. } => "questions",
            Task::Presentation { .. } => "presentation",
            Task::Speak { .. } => "speech",
            Task::Say { .. } => "speech",
            Task::Transcribe { .. } => "transcription",
            Task::Video { .. } => "video",
        }
    }
}

/// What a finished task produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub task: &'static str,
    /// The result as written to `<task>.json`.
    pub result: Value,
    /// Every file written, the JSON result last.
    pub artifacts: Vec<PathBuf>,
}

/// Runs flows against a generation service and saves their results.
pub struct App {
    flows: FlowContext,
    output_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Arc<dyn GenerationService>,
    pub models: ModelSet,
    pub poller: OperationPoller,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, output_dir: PathBuf) -> Self {
        Self {
            flows: FlowContext::new(services.generator, services.models, services.poller),
            output_dir,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;

        let date = Local::now().format("%Y-%m-%d").to_string();
        let session_id = Uuid::new_v4();
        let output_dir = config
            .output_dir
            .join(format!("{}_{}", date, session_id));

        fs::create_dir_all(&output_dir)?;
        info!("Created output directory: {}", output_dir.display());

        let generator = GeminiClient::new_with_client(
            config.gemini_api_key.clone(),
            config.request_timeout,
            reqwest::Client::new(),
        )
        .with_base_url(config.gemini_base_url.clone());
        info!(
            "Models: chat={}, analysis={}, fast={}, tts={}, video={}",
            config.models.chat,
            config.models.analysis,
            config.models.fast,
            config.models.tts,
            config.models.video
        );

        Ok(Self::with_services(
            AppServices {
                generator: Arc::new(generator),
                models: config.models,
                poller: OperationPoller::new(config.poll_interval, config.poll_timeout),
            },
            output_dir,
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run `task`, write its artifacts, and report what was produced.
    pub async fn run(&self, task: Task, cancel: &CancellationToken) -> Result<TaskReport> {
        let name = task.name();
        info!("Running task: {}", name);

        let mut artifacts = Vec::new();
        let result = match self.execute(task, cancel, &mut artifacts).await {
            Ok(result) => result,
            Err(e) => {
                error!("Task {} failed: {}", name, e);
                return Err(e);
            }
        };

        let json_path = self.output_dir.join(format!("{}.json", name));
        self.write(&json_path, serde_json::to_string_pretty(&result)?.as_bytes())?;
        artifacts.push(json_path);

        info!("Task {} complete ({} files)", name, artifacts.len());
        Ok(TaskReport {
            task: name,
            result,
            artifacts,
        })
    }

    async fn execute(
        &self,
        task: Task,
        cancel: &CancellationToken,
        artifacts: &mut Vec<PathBuf>,
    ) -> Result<Value> {
        let ctx = &self.flows;
        match task {
            Task::Chat {
                prompt,
                file,
                history,
            } => {
                let input = ChatInput {
                    history: match history {
                        Some(path) => load_history(&path)?,
                        None => Vec::new(),
                    },
                    prompt,
                    file: load_optional(file.as_deref()).await?,
                };
                let reply = chat::chat(ctx, &input, cancel).await?;
                self.chat_result(reply, artifacts)
            }
            Task::Chart { file } => {
                let file = load(&file).await?;
                to_value(&chart::analyze_chart(ctx, &file, cancel).await?)
            }
            Task::Summarize { file } => {
                let file = load(&file).await?;
                to_value(&summary::summarize_document(ctx, &file, cancel).await?)
            }
            Task::MindMap { file } => {
                let file = load(&file).await?;
                to_value(&mind_map::generate_mind_map(ctx, &file, cancel).await?)
            }
            Task::Questions { file, options } => {
                options.validate()?;
                let file = load(&file).await?;
                to_value(&questions::generate_questions(ctx, &file, options, cancel).await?)
            }
            Task::Presentation { file } => {
                let file = load(&file).await?;
                to_value(&presentation::create_presentation(ctx, &file, cancel).await?)
            }
            Task::Speak { file, voice } => {
                let file = load(&file).await?;
                let wav = speech::document_to_speech(ctx, &file, voice, cancel).await?;
                self.save_speech(&wav, artifacts)
            }
            Task::Say { text } => {
                let wav = speech::text_to_speech(ctx, &text, cancel).await?;
                self.save_speech(&wav, artifacts)
            }
            Task::Transcribe {
                audio,
                text,
                language,
            } => {
                let input = TranscriptionInput {
                    audio: load_optional(audio.as_deref()).await?,
                    existing_text: text,
                    language,
                };
                to_value(&transcribe::transcribe_and_summarize(ctx, &input, cancel).await?)
            }
            Task::Video {
                prompt,
                file,
                duration_seconds,
                aspect_ratio,
            } => {
                let mut options = VideoOptions {
                    prompt,
                    file: None,
                    duration_seconds,
                    aspect_ratio,
                };
                options.validate()?;
                options.file = load_optional(file.as_deref()).await?;
                let artifact = video::generate_video(ctx, &options, cancel).await?;
                self.save_video(&artifact, artifacts)
            }
        }
    }

    fn chat_result(&self, reply: ChatReply, artifacts: &mut Vec<PathBuf>) -> Result<Value> {
        let message = reply.message();
        let ChatReply::Tool { invocation, output } = reply else {
            return Ok(json!({ "reply": message }));
        };

        let result = match &output {
            ToolOutput::Presentation(deck) => to_value(deck)?,
            ToolOutput::Chart(analysis) => to_value(analysis)?,
            ToolOutput::Summary(summary) => to_value(summary)?,
            ToolOutput::Speech(wav) => self.save_speech(wav, artifacts)?,
            ToolOutput::Video(artifact) => self.save_video(artifact, artifacts)?,
        };
        Ok(json!({
            "reply": message,
            "tool": invocation.name(),
            "result": result,
        }))
    }

    fn save_speech(&self, wav: &WavAudio, artifacts: &mut Vec<PathBuf>) -> Result<Value> {
        let path = self.output_dir.join("speech.wav");
        self.write(&path, &wav.bytes)?;
        artifacts.push(path.clone());
        Ok(json!({
            "audioFile": path.display().to_string(),
            "bytes": wav.bytes.len(),
            "durationSecs": wav.duration_secs(),
        }))
    }

    fn save_video(&self, artifact: &VideoArtifact, artifacts: &mut Vec<PathBuf>) -> Result<Value> {
        let extension = if artifact.mime_type == "video/webm" {
            "webm"
        } else {
            "mp4"
        };
        let path = self.output_dir.join(format!("video.{}", extension));
        self.write(&path, &artifact.bytes)?;
        artifacts.push(path.clone());
        Ok(json!({
            "videoFile": path.display().to_string(),
            "mimeType": artifact.mime_type,
            "bytes": artifact.bytes.len(),
        }))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::write(path, bytes)?;
        info!("Saved {}", path.display());
        Ok(())
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

async fn load(path: &Path) -> Result<MediaReference> {
    MediaReference::from_path(path, None).await
}

async fn load_optional(path: Option<&Path>) -> Result<Option<MediaReference>> {
    match path {
        Some(path) => Ok(Some(load(path).await?)),
        None => Ok(None),
    }
}

fn load_history(path: &Path) -> Result<Vec<ChatTurn>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::models::{GeneratedMedia, GenerationResponse, OperationHandle, ResponsePart};
    use crate::Error;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn setup_test_dirs() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();
        (dir, output_dir)
    }

    fn build_test_app(output_dir: &Path, generator: MockGenerationClient) -> App {
        App::with_services(
            AppServices {
                generator: Arc::new(generator),
                models: ModelSet::default(),
                poller: OperationPoller::new(Duration::from_millis(1), Some(Duration::from_secs(5))),
            },
            output_dir.to_path_buf(),
        )
    }

    fn write_pdf(dir: &Path) -> PathBuf {
        let path = dir.join("notes.pdf");
        fs::write(&path, b"%PDF-1.7 lecture notes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_summarize_writes_json() {
        let (dir, output_dir) = setup_test_dirs();
        let mock = MockGenerationClient::new().with_text_response("{\"summary\": \"Notes.\"}");
        let app = build_test_app(&output_dir, mock);

        let report = app
            .run(
                Task::Summarize {
                    file: write_pdf(dir.path()),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.task, "summary");
        assert_eq!(report.result, json!({ "summary": "Notes." }));
        let saved = fs::read_to_string(output_dir.join("summary.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&saved).unwrap(), report.result);
    }

    #[tokio::test]
    async fn test_say_writes_wav() {
        let (_dir, output_dir) = setup_test_dirs();
        let mock = MockGenerationClient::new().with_response(GenerationResponse {
            parts: vec![ResponsePart::Media(MediaReference {
                mime_type: "audio/L16;codec=pcm;rate=24000".to_string(),
                data: "AAAAAA==".to_string(),
            })],
        });
        let app = build_test_app(&output_dir, mock);

        let report = app
            .run(
                Task::Say {
                    text: "hello".to_string(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let wav = fs::read(output_dir.join("speech.wav")).unwrap();
        assert_eq!(wav.len(), 44 + 4);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(report.result["bytes"], 48);
        assert_eq!(
            report.artifacts,
            vec![output_dir.join("speech.wav"), output_dir.join("speech.json")]
        );
    }

    #[tokio::test]
    async fn test_video_writes_mp4() {
        let (_dir, output_dir) = setup_test_dirs();
        let mock = MockGenerationClient::new()
            .with_operation(OperationHandle::pending("operations/v"))
            .with_poll_response(OperationHandle::finished(
                "operations/v",
                vec![GeneratedMedia::Remote {
                    uri: "https://files.example/v.mp4".to_string(),
                    mime_type: "video/mp4".to_string(),
                }],
            ))
            .with_download(b"\0\0\0\x18ftypmp42".to_vec());
        let app = build_test_app(&output_dir, mock);

        let report = app
            .run(
                Task::Video {
                    prompt: "a calm sea".to_string(),
                    file: None,
                    duration_seconds: 6,
                    aspect_ratio: AspectRatio::Portrait,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.result["mimeType"], "video/mp4");
        assert_eq!(fs::read(output_dir.join("video.mp4")).unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_chat_with_history_file() {
        let (dir, output_dir) = setup_test_dirs();
        let history = dir.path().join("history.json");
        fs::write(
            &history,
            r#"[{"role": "user", "content": "Hi"}, {"role": "model", "content": "Hello!"}]"#,
        )
        .unwrap();
        let mock = MockGenerationClient::new().with_text_response("Sure.");
        let probe = mock.clone();
        let app = build_test_app(&output_dir, mock);

        let report = app
            .run(
                Task::Chat {
                    prompt: "Can you help?".to_string(),
                    file: None,
                    history: Some(history),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.result, json!({ "reply": "Sure." }));
        assert_eq!(probe.requests()[0].history.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_reading_files() {
        let (dir, output_dir) = setup_test_dirs();
        let mock = MockGenerationClient::new();
        let probe = mock.clone();
        let app = build_test_app(&output_dir, mock);

        let err = app
            .run(
                Task::Questions {
                    file: dir.path().join("missing.pdf"),
                    options: QuestionOptions {
                        count: 500,
                        ..QuestionOptions::default()
                    },
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(probe.get_call_count(), 0);
        assert!(!output_dir.join("questions.json").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_encoding_error() {
        let (dir, output_dir) = setup_test_dirs();
        let app = build_test_app(&output_dir, MockGenerationClient::new());

        let err = app
            .run(
                Task::Chart {
                    file: dir.path().join("missing.png"),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
