use std::fmt;

use serde::{Deserialize, Serialize};

/// Processing status carried by each resume of a job.
///
/// Only the background pipeline writes these; this service groups and counts
/// them. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResumeStatus {
    /// Uploaded, not yet picked up by the parser.
    Pending,
    Parsing,
    Embedding,
    Scoring,
    Completed,
    Failed,
    Other(String),
}

impl ResumeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResumeStatus::Pending => "PENDING",
            ResumeStatus::Parsing => "PARSING",
            ResumeStatus::Embedding => "EMBEDDING",
            ResumeStatus::Scoring => "SCORING",
            ResumeStatus::Completed => "COMPLETED",
            ResumeStatus::Failed => "FAILED",
            ResumeStatus::Other(raw) => raw,
        }
    }

    /// Parsing, embedding or scoring.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ResumeStatus::Parsing | ResumeStatus::Embedding | ResumeStatus::Scoring
        )
    }
}

impl From<String> for ResumeStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => ResumeStatus::Pending,
            "PARSING" => ResumeStatus::Parsing,
            "EMBEDDING" => ResumeStatus::Embedding,
            "SCORING" => ResumeStatus::Scoring,
            "COMPLETED" => ResumeStatus::Completed,
            "FAILED" => ResumeStatus::Failed,
            _ => ResumeStatus::Other(raw),
        }
    }
}

impl From<&str> for ResumeStatus {
    fn from(raw: &str) -> Self {
        ResumeStatus::from(raw.to_string())
    }
}

impl From<ResumeStatus> for String {
    fn from(status: ResumeStatus) -> Self {
        match status {
            ResumeStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
