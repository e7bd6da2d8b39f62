use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored CV as seen by the ranking engine.
///
/// `text` is the extracted document text; it is never serialized into responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: i64,
    pub filename: String,
    #[serde(skip_serializing, default)]
    pub text: Option<String>,
    pub score: i32,
    pub feedback: String,
}

impl CandidateRecord {
    pub fn new(id: i64, filename: impl Into<String>, text: Option<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            text,
            score: 0,
            feedback: String::new(),
        }
    }

    /// Candidates without extracted text are never ranked.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub file_name: String,
    pub ai_score: Option<i32>,
    pub ai_feedback: Option<String>,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        let mut record = CandidateRecord::new(row.id, row.file_name, None);
        record.score = row.ai_score.unwrap_or(0);
        record.feedback = row.ai_feedback.unwrap_or_default();
        record
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct JobDescription {
    pub id: i64,
    pub description: String,
    pub date_added: DateTime<Utc>,
}
