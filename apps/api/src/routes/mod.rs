pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/candidates", get(handlers::handle_list_candidates))
        .route(
            "/api/v1/rankings/keywords",
            post(handlers::handle_rank_keywords),
        )
        .route(
            "/api/v1/rankings/analysis",
            post(handlers::handle_rank_analysis),
        )
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/experience", post(handlers::handle_experience))
        .with_state(state)
}
