use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, CandidateRow, JobDescription};
use crate::storage::CandidateStore;

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT id, file_name, ai_score, ai_feedback FROM cv_storage ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CandidateRecord::from).collect())
    }

    async fn get_text(&self, id: i64) -> Result<Option<String>, AppError> {
        let text: Option<Option<String>> =
            sqlx::query_scalar("SELECT cv_text FROM cv_storage WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(text.flatten())
    }

    async fn persist_analysis(&self, id: i64, score: i32, feedback: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE cv_storage SET ai_score = $1, ai_feedback = $2 WHERE id = $3")
            .bind(score)
            .bind(feedback)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Candidate {id} not found")));
        }
        Ok(())
    }

    async fn get_job_description(&self, id: i64) -> Result<Option<JobDescription>, AppError> {
        let job = sqlx::query_as(
            "SELECT id, description, date_added FROM job_descriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}
