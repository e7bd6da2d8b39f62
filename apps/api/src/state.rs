use std::sync::Arc;

use crate::analysis::AnalysisProvider;
use crate::ranking::engine::RankingEngine;
use crate::storage::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    /// Pluggable analysis provider. Default: LocalHeuristicProvider. Swap via ANALYSIS_PROVIDER.
    pub provider: Arc<dyn AnalysisProvider>,
    pub engine: RankingEngine,
}
