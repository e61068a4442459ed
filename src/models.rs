//! Data models and structures
//!
//! Defines the provider-neutral request/response values exchanged with the
//! generation capability, plus environment configuration.

use crate::media::MediaReference;
use crate::schema::Schema;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One ordered piece of a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Media(MediaReference),
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text(text.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Audio,
    Image,
}

/// Model selection and per-call generation settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub response_modalities: Vec<Modality>,
    pub voice: Option<String>,
    pub duration_seconds: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub person_generation: Option<String>,
}

impl ModelConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A function the model may ask the caller to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// `None` for tools that take no arguments.
    pub parameters: Option<Schema>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub parts: Vec<PromptPart>,
    pub system: Option<String>,
    pub history: Vec<ChatTurn>,
    pub output_schema: Option<Schema>,
    pub tools: Vec<ToolDeclaration>,
    pub model: ModelConfig,
}

impl GenerationRequest {
    pub fn new(model: ModelConfig, parts: Vec<PromptPart>) -> Self {
        Self {
            parts,
            system: None,
            history: Vec::new(),
            output_schema: None,
            tools: Vec::new(),
            model,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn media(&self) -> impl Iterator<Item = &MediaReference> {
        self.parts.iter().filter_map(|p| match p {
            PromptPart::Media(m) => Some(m),
            PromptPart::Text(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Text(String),
    Media(MediaReference),
    FunctionCall {
        name: String,
        args: serde_json::Value,
    },
}

/// Output of a synchronous generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub parts: Vec<ResponsePart>,
}

impl GenerationResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text.into())],
        }
    }

    /// All text parts joined together, or `None` when there is no text.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// First inline media part whose MIME type starts with `prefix`.
    pub fn media(&self, prefix: &str) -> Option<&MediaReference> {
        self.parts.iter().find_map(|p| match p {
            ResponsePart::Media(m) if m.mime_type.starts_with(prefix) => Some(m),
            _ => None,
        })
    }

    pub fn function_call(&self) -> Option<(&str, &serde_json::Value)> {
        self.parts.iter().find_map(|p| match p {
            ResponsePart::FunctionCall { name, args } => Some((name.as_str(), args)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: String,
}

/// Media produced by a finished long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedMedia {
    Inline(MediaReference),
    Remote { uri: String, mime_type: String },
}

impl GeneratedMedia {
    pub fn mime_type(&self) -> &str {
        match self {
            GeneratedMedia::Inline(m) => &m.mime_type,
            GeneratedMedia::Remote { mime_type, .. } => mime_type,
        }
    }
}

/// Status of an asynchronous generation job.
///
/// Once `done` is true the handle is terminal and is not polled again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub name: String,
    pub done: bool,
    pub error: Option<OperationError>,
    pub output: Vec<GeneratedMedia>,
}

impl OperationHandle {
    pub fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            done: false,
            error: None,
            output: Vec::new(),
        }
    }

    pub fn finished(name: &str, output: Vec<GeneratedMedia>) -> Self {
        Self {
            name: name.to_string(),
            done: true,
            error: None,
            output,
        }
    }

    pub fn failed(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            done: true,
            error: Some(OperationError {
                code: None,
                message: message.to_string(),
            }),
            output: Vec::new(),
        }
    }
}

/// Model identifiers used by the flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    pub chat: String,
    pub analysis: String,
    pub fast: String,
    pub tts: String,
    pub video: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            chat: "gemini-2.5-pro".to_string(),
            analysis: "gemini-2.5-pro".to_string(),
            fast: "gemini-2.5-flash".to_string(),
            tts: "gemini-2.5-flash-preview-tts".to_string(),
            video: "veo-2.0-generate-001".to_string(),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub models: ModelSet,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// `None` waits for a long-running operation indefinitely.
    pub poll_timeout: Option<Duration>,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ModelSet::default();
        let var_or = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let secs = |key: &str, default: u64| -> Result<u64> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(v) => v.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a whole number of seconds, got '{}'", key, v))
                }),
                None => Ok(default),
            }
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let poll_interval = secs("POLL_INTERVAL_SECS", 5)?;
        if poll_interval == 0 {
            return Err(Error::Config("POLL_INTERVAL_SECS must be positive".to_string()));
        }
        let poll_timeout = match secs("POLL_TIMEOUT_SECS", 600)? {
            0 => None,
            n => Some(Duration::from_secs(n)),
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com".to_string(),
            ),
            models: ModelSet {
                chat: var_or("CHAT_MODEL", defaults.chat),
                analysis: var_or("ANALYSIS_MODEL", defaults.analysis),
                fast: var_or("FAST_MODEL", defaults.fast),
                tts: var_or("TTS_MODEL", defaults.tts),
                video: var_or("VIDEO_MODEL", defaults.video),
            },
            request_timeout: Duration::from_secs(secs("REQUEST_TIMEOUT_SECS", 120)?),
            poll_interval: Duration::from_secs(poll_interval),
            poll_timeout,
            output_dir: PathBuf::from(var_or("OUTPUT_DIR", "output".to_string())),
        })
    }
}
