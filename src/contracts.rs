//! Structured results returned by the document flows
//!
//! Each record declares the schema the model is asked to follow and the
//! invariants checked once the response has been parsed. A result either
//! passes validation as a whole or is rejected; partial results never leave
//! this module.

use crate::schema::{Schema, StructuredOutput};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Options per generated multiple-choice question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Levels of nested sub-ideas the mind-map schema describes below the root.
pub const MIND_MAP_SCHEMA_DEPTH: usize = 4;

/// Deepest mind map accepted from the model.
pub const MAX_MIND_MAP_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAnalysis {
    pub title: String,
    pub summary: String,
    pub table: DataTable,
}

impl StructuredOutput for ChartAnalysis {
    const NAME: &'static str = "chart analysis";

    fn schema() -> Schema {
        Schema::object(
            "Analysis of a chart or graph.",
            vec![
                ("title", Schema::string("The title of the chart.")),
                (
                    "summary",
                    Schema::string(
                        "A detailed summary and interpretation of the chart's data and trends, \
                         in the same language as the chart itself.",
                    ),
                ),
                (
                    "table",
                    Schema::object(
                        "The data extracted from the chart in a tabular format.",
                        vec![
                            (
                                "headers",
                                Schema::array(
                                    Schema::string("A column header."),
                                    "The headers for the data table, in the same language \
                                     as the chart itself.",
                                ),
                            ),
                            (
                                "rows",
                                Schema::array(
                                    Schema::array(Schema::string("A cell."), "One table row."),
                                    "The rows of data from the chart.",
                                ),
                            ),
                        ],
                    ),
                ),
            ],
        )
    }

    /// Rows wider than the header are rejected; narrower rows are padded.
    fn validate(mut self) -> Result<Self> {
        if self.title.trim().is_empty() {
            return Err(Error::EmptyResult("chart analysis has no title".to_string()));
        }

        let width = self.table.headers.len();
        for (i, row) in self.table.rows.iter_mut().enumerate() {
            if row.len() > width {
                return Err(Error::EmptyResult(format!(
                    "table row {} has {} cells but only {} headers",
                    i + 1,
                    row.len(),
                    width
                )));
            }
            if row.len() < width {
                tracing::warn!(
                    "Padding table row {} from {} to {} cells",
                    i + 1,
                    row.len(),
                    width
                );
                row.resize(width, String::new());
            }
        }

        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub summary: String,
}

impl StructuredOutput for DocumentSummary {
    const NAME: &'static str = "summary";

    fn schema() -> Schema {
        Schema::object(
            "Summary of a document or image.",
            vec![(
                "summary",
                Schema::string(
                    "A concise summary of the document/image content, in the same language \
                     as the content.",
                ),
            )],
        )
    }

    fn validate(self) -> Result<Self> {
        if self.summary.trim().is_empty() {
            return Err(Error::EmptyResult("summary is empty".to_string()));
        }
        Ok(self)
    }
}

/// One node of a mind map. The root is the central theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub title: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_ideas: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn depth(&self) -> usize {
        1 + self
            .sub_ideas
            .iter()
            .map(MindMapNode::depth)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .sub_ideas
            .iter()
            .map(MindMapNode::node_count)
            .sum::<usize>()
    }

    fn node_schema(levels_below: usize) -> Schema {
        let node = Schema::object(
            "A mind map node.",
            vec![
                (
                    "title",
                    Schema::string("The main idea or title of this node."),
                ),
                (
                    "details",
                    Schema::string("Detailed information or explanation for this node."),
                ),
            ],
        );
        if levels_below == 0 {
            return node;
        }
        node.with_optional(
            "subIdeas",
            Schema::array(
                Self::node_schema(levels_below - 1),
                "An array of nested sub-ideas.",
            ),
        )
    }
}

impl StructuredOutput for MindMapNode {
    const NAME: &'static str = "mind map";

    /// The schema dialect has no references, so recursion is unrolled.
    fn schema() -> Schema {
        Self::node_schema(MIND_MAP_SCHEMA_DEPTH)
    }

    fn validate(self) -> Result<Self> {
        if self.title.trim().is_empty() {
            return Err(Error::EmptyResult("mind map has no central theme".to_string()));
        }
        let depth = self.depth();
        if depth > MAX_MIND_MAP_DEPTH {
            return Err(Error::EmptyResult(format!(
                "mind map is {} levels deep (limit {})",
                depth, MAX_MIND_MAP_DEPTH
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl Question {
    /// Index of the option equal to the correct answer.
    pub fn correct_index(&self) -> Option<usize> {
        let answer = self.correct_answer.trim();
        self.options.iter().position(|o| o.trim() == answer)
    }

    fn check(&self, number: usize) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::EmptyResult(format!("question {} has no text", number)));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(Error::EmptyResult(format!(
                "question {} has {} options, expected {}",
                number,
                self.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        let answer = self.correct_answer.trim();
        let matches = self.options.iter().filter(|o| o.trim() == answer).count();
        match matches {
            1 => Ok(()),
            0 => Err(Error::EmptyResult(format!(
                "question {}: correct answer '{}' is not one of the options",
                number, self.correct_answer
            ))),
            n => Err(Error::EmptyResult(format!(
                "question {}: correct answer '{}' matches {} options",
                number, self.correct_answer, n
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// Schema asking for exactly `count` questions.
    pub fn schema_with_count(count: u32) -> Schema {
        Self::schema_from(Self::question_array().with_item_count(Some(count), Some(count)))
    }

    fn question_array() -> Schema {
        let option_count = OPTIONS_PER_QUESTION as u32;
        Schema::array(
            Schema::object(
                "A multiple-choice question.",
                vec![
                    ("question", Schema::string("The question text.")),
                    (
                        "options",
                        Schema::array(
                            Schema::string("A possible answer."),
                            "An array of 4 possible answers.",
                        )
                        .with_item_count(Some(option_count), Some(option_count)),
                    ),
                    (
                        "correctAnswer",
                        Schema::string("The correct answer, copied exactly from the options."),
                    ),
                    (
                        "explanation",
                        Schema::string("An explanation for why the answer is correct."),
                    ),
                ],
            ),
            "The array of generated questions.",
        )
    }

    fn schema_from(questions: Schema) -> Schema {
        Schema::object("Generated questions.", vec![("questions", questions)])
    }
}

impl StructuredOutput for QuestionSet {
    const NAME: &'static str = "question set";

    fn schema() -> Schema {
        Self::schema_from(Self::question_array())
    }

    fn validate(self) -> Result<Self> {
        if self.questions.is_empty() {
            return Err(Error::EmptyResult("no questions were generated".to_string()));
        }
        for (i, question) in self.questions.iter().enumerate() {
            question.check(i + 1)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl StructuredOutput for Presentation {
    const NAME: &'static str = "presentation";

    fn schema() -> Schema {
        Schema::object(
            "A slide deck outline.",
            vec![
                (
                    "title",
                    Schema::string("The main title for the entire presentation."),
                ),
                (
                    "slides",
                    Schema::array(
                        Schema::object(
                            "One slide.",
                            vec![
                                ("title", Schema::string("The title for this slide.")),
                                (
                                    "points",
                                    Schema::array(
                                        Schema::string("A bullet point."),
                                        "An array of bullet points for the slide body.",
                                    ),
                                ),
                            ],
                        ),
                        "An array of slides.",
                    ),
                ),
            ],
        )
    }

    fn validate(self) -> Result<Self> {
        if self.title.trim().is_empty() {
            return Err(Error::EmptyResult("presentation has no title".to_string()));
        }
        if self.slides.is_empty() {
            return Err(Error::EmptyResult("presentation has no slides".to_string()));
        }
        Ok(self)
    }
}

/// Transcript of a recording plus its summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcription: String,
    pub summary: String,
}
