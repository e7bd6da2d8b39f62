use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, JobDescription};
use crate::storage::CandidateStore;

/// Candidate store backed by a `Vec`, for tests.
#[derive(Default)]
pub struct InMemoryCandidateStore {
    candidates: Mutex<Vec<CandidateRecord>>,
    job_descriptions: Vec<JobDescription>,
    failing_ids: HashSet<i64>,
    persisted: Mutex<Vec<(i64, i32, String)>>,
}

impl InMemoryCandidateStore {
    pub fn new(candidates: Vec<CandidateRecord>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            ..Self::default()
        }
    }

    pub fn with_job_descriptions(mut self, jobs: Vec<JobDescription>) -> Self {
        self.job_descriptions = jobs;
        self
    }

    /// `persist_analysis` fails for these ids.
    pub fn failing_on(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.failing_ids = ids.into_iter().collect();
        self
    }

    /// Every successful `persist_analysis` call, in call order.
    pub async fn persisted(&self) -> Vec<(i64, i32, String)> {
        self.persisted.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Vec<CandidateRecord> {
        self.candidates.lock().await.clone()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        Ok(self
            .candidates
            .lock()
            .await
            .iter()
            .map(|c| CandidateRecord {
                text: None,
                ..c.clone()
            })
            .collect())
    }

    async fn get_text(&self, id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .candidates
            .lock()
            .await
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.text.clone()))
    }

    async fn persist_analysis(&self, id: i64, score: i32, feedback: &str) -> Result<(), AppError> {
        if self.failing_ids.contains(&id) {
            return Err(AppError::Internal(anyhow::anyhow!("simulated write failure for {id}")));
        }

        let mut candidates = self.candidates.lock().await;
        let candidate = candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
        candidate.score = score;
        candidate.feedback = feedback.to_string();

        self.persisted
            .lock()
            .await
            .push((id, score, feedback.to_string()));
        Ok(())
    }

    async fn get_job_description(&self, id: i64) -> Result<Option<JobDescription>, AppError> {
        Ok(self.job_descriptions.iter().find(|j| j.id == id).cloned())
    }
}
