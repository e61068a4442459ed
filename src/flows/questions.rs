use super::{DocumentPrompt, FlowContext};
use crate::contracts::QuestionSet;
use crate::media::MediaReference;
use crate::prompts;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(Error::InvalidInput(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// Interactive questions are answered one at a time with feedback; fixed
/// questions are printed as an exam with labelled options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStyle {
    #[default]
    Interactive,
    Fixed,
}

impl FromStr for QuestionStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" => Ok(QuestionStyle::Interactive),
            "fixed" => Ok(QuestionStyle::Fixed),
            other => Err(Error::InvalidInput(format!("unknown question style '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionOptions {
    pub count: u32,
    pub difficulty: Difficulty,
    pub style: QuestionStyle,
}

impl Default for QuestionOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_QUESTION_COUNT,
            difficulty: Difficulty::default(),
            style: QuestionStyle::default(),
        }
    }
}

impl QuestionOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_QUESTION_COUNT).contains(&self.count) {
            return Err(Error::InvalidInput(format!(
                "question count must be between 1 and {}, got {}",
                MAX_QUESTION_COUNT, self.count
            )));
        }
        Ok(())
    }

    fn instructions(&self) -> String {
        let style = match self.style {
            QuestionStyle::Interactive => prompts::QUESTIONS_INTERACTIVE,
            QuestionStyle::Fixed => prompts::QUESTIONS_FIXED,
        };
        let count = self.count.to_string();
        let difficulty = self.difficulty.to_string();
        prompts::render(
            prompts::QUESTIONS_USER,
            &[
                ("count", count.as_str()),
                ("difficulty", difficulty.as_str()),
                ("style", style.trim_end()),
            ],
        )
    }
}

/// Multiple-choice questions about a document. Every returned question has
/// four options, exactly one of which is the correct answer.
pub async fn generate_questions(
    ctx: &FlowContext,
    file: &MediaReference,
    options: QuestionOptions,
    cancel: &CancellationToken,
) -> Result<QuestionSet> {
    options.validate()?;
    info!(
        "Generating {} {} {:?} questions ({})",
        options.count, options.difficulty, options.style, file.mime_type
    );

    let mut set: QuestionSet = ctx
        .generate_structured(
            DocumentPrompt {
                model: &ctx.models().fast,
                system: prompts::QUESTIONS_SYSTEM,
                instructions: options.instructions(),
                file,
                schema: Some(QuestionSet::schema_with_count(options.count)),
            },
            cancel,
        )
        .await?;

    let requested = options.count as usize;
    if set.questions.len() > requested {
        warn!(
            "Model returned {} questions, keeping the first {}",
            set.questions.len(),
            requested
        );
        set.questions.truncate(requested);
    } else if set.questions.len() < requested {
        warn!(
            "Model returned {} of {} requested questions",
            set.questions.len(),
            requested
        );
    }

    info!("Generated {} questions", set.questions.len());
    Ok(set)
}
