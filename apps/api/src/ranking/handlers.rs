//! Axum route handlers for the Ranking API.

use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::AnalysisResult;
use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::ranking::engine::{filter_min_score, rank_by_keywords};
use crate::ranking::experience::{estimate, ExperienceEstimate};
use crate::ranking::settings::ScoringSettings;
use crate::state::AppState;
use crate::storage::load_candidates;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct KeywordRankRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub required_experience_years: u32,
    #[serde(default)]
    pub settings: ScoringSettings,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRankRequest {
    pub job_description: Option<String>,
    pub job_description_id: Option<i64>,
    pub min_score: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    Keywords,
    Analysis,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub mode: RankingMode,
    pub ranked: Vec<CandidateRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub cv_text: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct ExperienceRequest {
    pub text: String,
    /// Date `present` resolves to; defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    Ok(Json(state.store.list_candidates().await?))
}

/// POST /api/v1/rankings/keywords
///
/// Ranks every stored CV by keyword presence plus detected experience.
pub async fn handle_rank_keywords(
    State(state): State<AppState>,
    Json(request): Json<KeywordRankRequest>,
) -> Result<Json<RankingResponse>, AppError> {
    let candidates = load_candidates(state.store.as_ref()).await?;
    info!(
        "Keyword ranking: {} candidates, {} keywords, {}+ years required",
        candidates.len(),
        request.keywords.len(),
        request.required_experience_years
    );

    let ranked = rank_by_keywords(
        candidates,
        &request.keywords,
        request.required_experience_years,
        &request.settings,
    );

    Ok(Json(RankingResponse {
        mode: RankingMode::Keywords,
        ranked,
    }))
}

/// POST /api/v1/rankings/analysis
///
/// Ranks every stored CV with the configured analysis provider, against either
/// an inline job description or a stored one.
pub async fn handle_rank_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRankRequest>,
) -> Result<Json<RankingResponse>, AppError> {
    let job_description = match (request.job_description, request.job_description_id) {
        (Some(text), None) => text,
        (None, Some(id)) => state
            .store
            .get_job_description(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))?
            .description,
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "provide job_description or job_description_id, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "job_description or job_description_id is required".to_string(),
            ))
        }
    };

    let candidates = load_candidates(state.store.as_ref()).await?;
    let ranked = state
        .engine
        .rank_all(
            candidates,
            &job_description,
            state.provider.clone(),
            state.store.clone(),
        )
        .await;

    let ranked = match request.min_score {
        Some(min) => filter_min_score(ranked, min),
        None => ranked,
    };

    Ok(Json(RankingResponse {
        mode: RankingMode::Analysis,
        ranked,
    }))
}

/// POST /api/v1/analyze
///
/// Scores a single CV text without touching storage.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<AnalysisResult> {
    Json(
        state
            .provider
            .analyze(&request.cv_text, &request.job_description)
            .await,
    )
}

/// POST /api/v1/experience
pub async fn handle_experience(Json(request): Json<ExperienceRequest>) -> Json<ExperienceEstimate> {
    let today = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Json(estimate(&request.text, today))
}
