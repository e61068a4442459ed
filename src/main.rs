use anyhow::Result;
use clap::{Parser, Subcommand};
use mahmoud_ai::app::{App, Task};
use mahmoud_ai::flows::questions::{Difficulty, QuestionOptions, QuestionStyle};
use mahmoud_ai::flows::speech::Voice;
use mahmoud_ai::flows::video::{AspectRatio, DEFAULT_VIDEO_SECONDS};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mahmoud-ai")]
#[command(about = "AI tools for documents, speech and video")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the assistant a question, optionally about a file.
    Chat {
        prompt: String,
        #[arg(long)]
        file: Option<PathBuf>,
        /// JSON file with earlier turns of the conversation.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Extract the title, summary and data table from a chart.
    Chart { file: PathBuf },
    /// Summarize a document or image.
    Summarize { file: PathBuf },
    /// Build a hierarchical mind map of a document.
    MindMap { file: PathBuf },
    /// Generate multiple-choice questions from a document.
    Questions {
        file: PathBuf,
        #[arg(long, default_value_t = 5)]
        count: u32,
        /// easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// interactive or fixed
        #[arg(long, default_value = "interactive")]
        style: QuestionStyle,
    },
    /// Turn a document into a slide outline.
    Presentation { file: PathBuf },
    /// Read a document aloud.
    Speak {
        file: PathBuf,
        /// male or female
        #[arg(long, default_value = "female")]
        voice: Voice,
    },
    /// Speak the given text.
    Say { text: String },
    /// Transcribe a recording and summarize it.
    Transcribe {
        #[arg(long)]
        audio: Option<PathBuf>,
        /// Existing transcript to summarize when no recording is given.
        #[arg(long)]
        text: Option<String>,
        /// Language of the transcript and summary. Defaults to the recording's
        /// own language; pass `--language Arabic` for Arabic output regardless
        /// of what was spoken.
        #[arg(long)]
        language: Option<String>,
    },
    /// Generate a short video from a prompt and an optional image or document.
    Video {
        prompt: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_VIDEO_SECONDS)]
        duration: u32,
        /// 16:9 or 9:16
        #[arg(long, default_value = "16:9")]
        aspect_ratio: AspectRatio,
    },
}

impl From<Command> for Task {
    fn from(command: Command) -> Self {
        match command {
            Command::Chat {
                prompt,
                file,
                history,
            } => Task::Chat {
                prompt,
                file,
                history,
            },
            Command::Chart { file } => Task::Chart { file },
            Command::Summarize { file } => Task::Summarize { file },
            Command::MindMap { file } => Task::MindMap { file },
            Command::Questions {
                file,
                count,
                difficulty,
                style,
            } => Task::Questions {
                file,
                options: QuestionOptions {
                    count,
                    difficulty,
                    style,
                },
            },
            Command::Presentation { file } => Task::Presentation { file },
            Command::Speak { file, voice } => Task::Speak { file, voice },
            Command::Say { text } => Task::Say { text },
            Command::Transcribe {
                audio,
                text,
                language,
            } => Task::Transcribe {
                audio,
                text,
                language,
            },
            Command::Video {
                prompt,
                file,
                duration,
                aspect_ratio,
            } => Task::Video {
                prompt,
                file,
                duration_seconds: duration,
                aspect_ratio,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mahmoud_ai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let task = Task::from(args.command);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match App::new().await {
        Ok(app) => match app.run(task, &cancel).await {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report.result)?);
                info!("Results saved to {}", app.output_dir().display());
                Ok(())
            }
            Err(e) => {
                error!("Task failed: {}", e);
                if e.is_user_retryable() {
                    info!("Run it again with a different file or prompt");
                }
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
