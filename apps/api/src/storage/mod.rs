//! Candidate storage — the collaborator the ranking engine reads CVs from and
//! hands analysis results to.
//!
//! Production uses `PgCandidateStore`; tests use the in-memory store.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, JobDescription};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgCandidateStore;

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// All stored candidates, without their text.
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, AppError>;

    async fn get_text(&self, id: i64) -> Result<Option<String>, AppError>;

    /// Writes score and feedback together; a candidate never holds half an analysis.
    async fn persist_analysis(&self, id: i64, score: i32, feedback: &str) -> Result<(), AppError>;

    async fn get_job_description(&self, id: i64) -> Result<Option<JobDescription>, AppError>;
}

/// Snapshot of every candidate with its extracted text filled in.
pub async fn load_candidates(store: &dyn CandidateStore) -> Result<Vec<CandidateRecord>, AppError> {
    let mut candidates = store.list_candidates().await?;
    for candidate in &mut candidates {
        candidate.text = store.get_text(candidate.id).await?;
    }
    Ok(candidates)
}
