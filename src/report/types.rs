use serde::{Deserialize, Serialize};

/// Which backend produced a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The external workflow engine.
    Kestra,
    /// The local deterministic summarizer.
    Demo,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Kestra => write!(f, "kestra"),
            Source::Demo => write!(f, "demo"),
        }
    }
}

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Demo,
    Live,
    Fallback,
}

impl Mode {
    /// `live` only when the engine produced the review; anything else is a fallback.
    pub fn for_live_source(source: Source) -> Self {
        match source {
            Source::Kestra => Mode::Live,
            Source::Demo => Mode::Fallback,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Demo => write!(f, "demo"),
            Mode::Live => write!(f, "live"),
            Mode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Changed files bucketed by what they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesGrouped {
    pub code: Vec<String>,
    pub tests: Vec<String>,
    pub docs: Vec<String>,
}

/// PR facts carried alongside a review for rendering. Never serialized
/// into the HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrMetadata {
    pub pr_number: u64,
    pub repository: String,
    pub author: String,
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// A complete review, regardless of which backend produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub title: String,
    pub summary: String,
    pub files_grouped: FilesGrouped,
    pub risks: Vec<String>,
    pub checklist: Vec<String>,
    pub should_merge: bool,
    pub explanation: String,
    pub lint_summary: String,
    pub source: Source,
    pub metadata: PrMetadata,
}

/// The JSON body returned by `POST /analyze` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub summary: String,
    pub files_grouped: FilesGrouped,
    pub risks: Vec<String>,
    pub checklist: Vec<String>,
    pub should_merge: bool,
    pub explanation: String,
    pub lint_summary: String,
    pub source: Source,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip)]
    pub title: String,
    #[serde(skip)]
    pub metadata: PrMetadata,
}

impl AnalysisResponse {
    /// The only way a response is assembled. An empty explanation falls back
    /// to the summary so the caller always has something to show.
    pub fn new(review: Review, mode: Mode, note: Option<String>) -> Self {
        let explanation = if review.explanation.is_empty() {
            review.summary.clone()
        } else {
            review.explanation
        };
        Self {
            success: true,
            summary: review.summary,
            files_grouped: review.files_grouped,
            risks: review.risks,
            checklist: review.checklist,
            should_merge: review.should_merge,
            explanation,
            lint_summary: review.lint_summary,
            source: review.source,
            mode,
            note,
            title: review.title,
            metadata: review.metadata,
        }
    }
}
