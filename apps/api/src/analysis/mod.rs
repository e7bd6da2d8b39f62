//! Analysis providers — pluggable, trait-based scorers that rate a CV against a
//! job description and explain the score.
//!
//! Default: `LocalHeuristicProvider` (offline, deterministic).
//! Optional: `RemoteProvider` (external HTTP service, falls back on any failure).
//!
//! `AppState` holds an `Arc<dyn AnalysisProvider>`, chosen at startup via
//! `ANALYSIS_PROVIDER`.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ProviderKind};

pub mod local;
pub mod remote;

pub use local::LocalHeuristicProvider;
pub use remote::{RemoteProvider, RemoteSettings};

/// Which backend produced an `AnalysisResult`. `Fallback` marks a placeholder
/// score returned when the remote service could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisBackend {
    Local,
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: i32,
    pub feedback: String,
    pub backend: AnalysisBackend,
}

impl AnalysisResult {
    /// Placeholder returned whenever the remote service cannot be used.
    pub fn fallback() -> Self {
        Self {
            score: remote::FALLBACK_SCORE,
            feedback: remote::FALLBACK_FEEDBACK.to_string(),
            backend: AnalysisBackend::Fallback,
        }
    }
}

/// The analysis provider trait. Implementations never fail: a provider that
/// cannot produce a genuine result returns a clearly labelled fallback instead.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, cv_text: &str, job_description: &str) -> AnalysisResult;

    /// Short backend label for logs.
    fn name(&self) -> &'static str;
}

/// Builds the provider selected by configuration.
pub fn build_provider(config: &Config) -> Result<Arc<dyn AnalysisProvider>> {
    match &config.provider {
        ProviderKind::Local => Ok(Arc::new(LocalHeuristicProvider::new())),
        ProviderKind::Remote { endpoint, api_key } => {
            let provider = RemoteProvider::new(RemoteSettings {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                timeout: config.analysis_timeout,
                max_attempts: config.analysis_max_attempts,
            })
            .context("Failed to build remote analysis client")?;
            Ok(Arc::new(provider))
        }
    }
}
