use serde::{Deserialize, Serialize};

use crate::models::resume::ExperienceEntry;

/// What the `ai-suggest` function is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A professional summary; the result replaces the summary field.
    Summary,
    /// Improvement hints for a pasted job description; shown read-only.
    AnalyzeJobDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SuggestionContext {
    Summary {
        skills: Vec<String>,
        experiences: Vec<ExperienceEntry>,
    },
    JobAnalysis {
        #[serde(rename = "jobDescription")]
        job_description: String,
        #[serde(rename = "currentSummary")]
        current_summary: String,
    },
}

/// Body of `POST ai-suggest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRequest {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub context: SuggestionContext,
}
