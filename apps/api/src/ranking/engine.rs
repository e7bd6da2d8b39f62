//! Ranking engine — scores every candidate that has text and returns them best-first.
//!
//! Two modes:
//! - keyword+experience: synchronous and pure, driven by `ScoringSettings`.
//! - analysis: one `AnalysisProvider` call per candidate, run concurrently under
//!   a semaphore, each result persisted through the `CandidateStore`.
//!
//! Order is score descending; equal scores keep their input order.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisProvider;
use crate::models::candidate::CandidateRecord;
use crate::ranking::experience::estimate_years_as_of;
use crate::ranking::keywords::score_keywords;
use crate::ranking::settings::ScoringSettings;
use crate::storage::CandidateStore;

pub const KEYWORD_FEEDBACK: &str = "Manual scoring based on keywords and experience.";

/// Years beyond the requirement that still earn bonus points.
const MAX_BONUS_YEARS: u32 = 5;

/// Keyword + experience score for one document.
pub fn keyword_experience_score(
    text: &str,
    keywords: &[String],
    required_experience_years: u32,
    settings: &ScoringSettings,
    today: NaiveDate,
) -> i32 {
    let mut score = score_keywords(&text.to_lowercase(), keywords, settings.points_per_keyword);

    let years = estimate_years_as_of(text, today);
    if years >= required_experience_years {
        let extra_years = (years - required_experience_years).min(MAX_BONUS_YEARS);
        let bonus = (extra_years as i32).saturating_mul(settings.points_per_extra_year);
        score = score.saturating_add(settings.base_experience_points.saturating_add(bonus));
    }
    score
}

pub fn rank_by_keywords(
    candidates: Vec<CandidateRecord>,
    keywords: &[String],
    required_experience_years: u32,
    settings: &ScoringSettings,
) -> Vec<CandidateRecord> {
    rank_by_keywords_as_of(
        candidates,
        keywords,
        required_experience_years,
        settings,
        Utc::now().date_naive(),
    )
}

pub fn rank_by_keywords_as_of(
    candidates: Vec<CandidateRecord>,
    keywords: &[String],
    required_experience_years: u32,
    settings: &ScoringSettings,
    today: NaiveDate,
) -> Vec<CandidateRecord> {
    let mut ranked: Vec<CandidateRecord> = candidates
        .into_iter()
        .filter(CandidateRecord::has_text)
        .map(|mut candidate| {
            let text = candidate.text.as_deref().unwrap_or_default();
            let score =
                keyword_experience_score(text, keywords, required_experience_years, settings, today);
            debug!("Candidate {} keyword score {score}", candidate.id);
            candidate.score = score;
            candidate.feedback = KEYWORD_FEEDBACK.to_string();
            candidate
        })
        .collect();

    sort_ranked(&mut ranked);
    ranked
}

/// Stable sort, highest score first.
pub fn sort_ranked(ranked: &mut [CandidateRecord]) {
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Keeps candidates scoring at least `min_score`, order unchanged.
pub fn filter_min_score(ranked: Vec<CandidateRecord>, min_score: i32) -> Vec<CandidateRecord> {
    ranked.into_iter().filter(|c| c.score >= min_score).collect()
}

/// Runs analysis-mode ranking with a bound on in-flight provider calls.
#[derive(Debug, Clone)]
pub struct RankingEngine {
    max_concurrency: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(4)
    }
}

impl RankingEngine {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Scores each candidate with `provider`, persists `(score, feedback)` and
    /// returns the ranked list.
    ///
    /// Persistence failures are logged and the candidate stays in the result.
    /// Dropping the returned future aborts pending tasks; a candidate is either
    /// fully persisted or untouched.
    pub async fn rank_all(
        &self,
        candidates: Vec<CandidateRecord>,
        job_description: &str,
        provider: Arc<dyn AnalysisProvider>,
        store: Arc<dyn CandidateStore>,
    ) -> Vec<CandidateRecord> {
        let job_description: Arc<str> = Arc::from(job_description);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        info!(
            "Ranking {} candidates with {} provider (concurrency {})",
            candidates.len(),
            provider.name(),
            self.max_concurrency
        );

        for (position, mut candidate) in candidates
            .into_iter()
            .filter(CandidateRecord::has_text)
            .enumerate()
        {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let provider = Arc::clone(&provider);
            let store = Arc::clone(&store);
            let job_description = Arc::clone(&job_description);

            tasks.spawn(async move {
                let text = candidate.text.as_deref().unwrap_or_default();
                let result = provider.analyze(text, &job_description).await;
                drop(permit);

                if let Err(e) = store
                    .persist_analysis(candidate.id, result.score, &result.feedback)
                    .await
                {
                    warn!("Failed to persist analysis for candidate {}: {e}", candidate.id);
                }

                debug!("Candidate {} analysis score {}", candidate.id, result.score);
                candidate.score = result.score;
                candidate.feedback = result.feedback;
                (position, candidate)
            });
        }

        let mut scored = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => scored.push(entry),
                Err(e) => warn!("Analysis task did not complete: {e}"),
            }
        }

        // restore input order so the stable sort breaks ties deterministically
        scored.sort_by_key(|(position, _)| *position);
        let mut ranked: Vec<CandidateRecord> = scored.into_iter().map(|(_, c)| c).collect();
        sort_ranked(&mut ranked);

        info!("Ranked {} candidates", ranked.len());
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::analysis::{AnalysisBackend, AnalysisResult, LocalHeuristicProvider};
    use crate::storage::memory::InMemoryCandidateStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn cv(id: i64, text: Option<&str>) -> CandidateRecord {
        CandidateRecord::new(id, format!("cv{id}.pdf"), text.map(str::to_string))
    }

    fn ids(ranked: &[CandidateRecord]) -> Vec<i64> {
        ranked.iter().map(|c| c.id).collect()
    }

    /// Scores from a lookup table; sleeps longer for earlier ids so tasks finish out of order.
    struct TableProvider {
        scores: HashMap<String, i32>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TableProvider {
        fn new(entries: &[(&str, i32)]) -> Self {
            Self {
                scores: entries.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AnalysisProvider for TableProvider {
        async fn analyze(&self, cv_text: &str, _job_description: &str) -> AnalysisResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let score = self.scores.get(cv_text).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(5 * (10 - score.clamp(0, 9)) as u64)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            AnalysisResult {
                score,
                feedback: format!("table:{cv_text}"),
                backend: AnalysisBackend::Local,
            }
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    #[test]
    fn test_experience_bonus_capped_at_five_extra_years() {
        // 6 years against a requirement of 3 -> 20 + 3 * 5
        let text = "java developer 2018 to present";
        let score = keyword_experience_score(text, &kws(&["java"]), 3, &ScoringSettings::default(), today());
        assert_eq!(score, 10 + 35);

        // 15 years against 1 -> bonus capped at 5 extra years
        let text = "Jan 2009 to Jan 2024";
        let score = keyword_experience_score(text, &[], 1, &ScoringSettings::default(), today());
        assert_eq!(score, 20 + 5 * 5);
    }

    #[test]
    fn test_below_required_experience_gets_no_bonus() {
        let text = "python engineer Jan 2022 to Jan 2023";
        let score = keyword_experience_score(text, &kws(&["python"]), 3, &ScoringSettings::default(), today());
        assert_eq!(score, 10);
    }

    #[test]
    fn test_zero_required_experience_always_earns_base() {
        let score = keyword_experience_score("no dates here", &[], 0, &ScoringSettings::default(), today());
        assert_eq!(score, 20);
    }

    #[test]
    fn test_extreme_settings_saturate() {
        let settings = ScoringSettings {
            points_per_keyword: i32::MAX,
            base_experience_points: i32::MAX,
            points_per_extra_year: i32::MAX,
        };
        let text = "java kotlin Jan 2009 to Jan 2024";
        let score = keyword_experience_score(text, &kws(&["java", "kotlin"]), 0, &settings, today());
        assert_eq!(score, i32::MAX);

        let settings = ScoringSettings {
            points_per_keyword: i32::MIN,
            base_experience_points: 0,
            points_per_extra_year: 0,
        };
        let score = keyword_experience_score("java kotlin", &kws(&["java", "kotlin"]), 99, &settings, today());
        assert_eq!(score, i32::MIN);
    }

    #[test]
    fn test_rank_by_keywords_excludes_missing_text_and_sorts() {
        let candidates = vec![
            cv(1, Some("python only")),
            cv(2, None),
            cv(3, Some("rust and python")),
            cv(4, Some("")),
            cv(5, Some("rust")),
        ];
        let settings = ScoringSettings {
            points_per_keyword: 10,
            base_experience_points: 0,
            points_per_extra_year: 0,
        };

        let ranked = rank_by_keywords_as_of(candidates, &kws(&["rust", "python"]), 99, &settings, today());

        assert_eq!(ids(&ranked), vec![3, 1, 5]);
        assert_eq!(ranked[0].score, 20);
        assert!(ranked.iter().all(|c| c.feedback == KEYWORD_FEEDBACK));
    }

    #[test]
    fn test_rank_by_keywords_ties_keep_input_order() {
        let candidates = vec![cv(9, Some("go")), cv(2, Some("go")), cv(5, Some("go rust")), cv(1, Some("go"))];
        let ranked = rank_by_keywords_as_of(
            candidates,
            &kws(&["go", "rust"]),
            99,
            &ScoringSettings::default(),
            today(),
        );
        assert_eq!(ids(&ranked), vec![5, 9, 2, 1]);
    }

    #[test]
    fn test_rank_by_keywords_is_idempotent() {
        let candidates = vec![
            cv(1, Some("java 2015 - 2020")),
            cv(2, Some("kotlin java Jan 2019 to Jan 2023")),
            cv(3, Some("nothing relevant")),
        ];
        let keywords = kws(&["java", "kotlin"]);
        let first = rank_by_keywords_as_of(candidates.clone(), &keywords, 2, &ScoringSettings::default(), today());
        let second = rank_by_keywords_as_of(candidates, &keywords, 2, &ScoringSettings::default(), today());
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_min_score() {
        let mut a = cv(1, None);
        a.score = 70;
        let mut b = cv(2, None);
        b.score = 40;
        let mut c = cv(3, None);
        c.score = 55;
        assert_eq!(ids(&filter_min_score(vec![a, c, b], 55)), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_rank_all_orders_by_score_not_completion() {
        let candidates = vec![cv(1, Some("low")), cv(2, Some("high")), cv(3, Some("mid")), cv(4, Some("mid"))];
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()));
        let provider = Arc::new(TableProvider::new(&[("low", 1), ("high", 9), ("mid", 5)]));

        let ranked = RankingEngine::new(4)
            .rank_all(candidates, "any", provider, store.clone())
            .await;

        assert_eq!(ids(&ranked), vec![2, 3, 4, 1]);
        assert_eq!(ranked[0].feedback, "table:high");
    }

    #[tokio::test]
    async fn test_rank_all_skips_empty_text_and_persists_pairs() {
        let candidates = vec![cv(1, Some("high")), cv(2, None), cv(3, Some(""))];
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()));
        let provider = Arc::new(TableProvider::new(&[("high", 9)]));

        let ranked = RankingEngine::default()
            .rank_all(candidates, "any", provider, store.clone())
            .await;

        assert_eq!(ids(&ranked), vec![1]);
        assert_eq!(store.persisted().await, vec![(1, 9, "table:high".to_string())]);

        let stored = store.snapshot().await;
        assert_eq!((stored[0].score, stored[0].feedback.as_str()), (9, "table:high"));
        assert_eq!(stored[1].score, 0);
    }

    #[tokio::test]
    async fn test_rank_all_bounds_concurrency() {
        let candidates: Vec<_> = (1..=12).map(|id| cv(id, Some("mid"))).collect();
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()));
        let provider = Arc::new(TableProvider::new(&[("mid", 5)]));

        let ranked = RankingEngine::new(3)
            .rank_all(candidates, "any", provider.clone(), store)
            .await;

        assert_eq!(ranked.len(), 12);
        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
        // all scores equal: input order survives
        assert_eq!(ids(&ranked), (1..=12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_rank_all_keeps_candidate_when_persist_fails() {
        let candidates = vec![cv(1, Some("high")), cv(2, Some("low"))];
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()).failing_on([1]));
        let provider = Arc::new(TableProvider::new(&[("high", 9), ("low", 1)]));

        let ranked = RankingEngine::new(2)
            .rank_all(candidates, "any", provider, store.clone())
            .await;

        assert_eq!(ids(&ranked), vec![1, 2]);
        assert_eq!(ranked[0].score, 9);
        assert_eq!(store.persisted().await, vec![(2, 1, "table:low".to_string())]);
    }

    #[tokio::test]
    async fn test_dropped_rank_all_leaves_no_partial_analysis() {
        // each call sleeps 45ms; six calls two at a time cannot finish in 60ms
        let candidates: Vec<_> = (1..=6).map(|id| cv(id, Some("low"))).collect();
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()));
        let provider = Arc::new(TableProvider::new(&[("low", 1)]));
        let engine = RankingEngine::new(2);

        let outcome = tokio::time::timeout(
            Duration::from_millis(60),
            engine.rank_all(candidates, "any", provider, store.clone()),
        )
        .await;
        assert!(outcome.is_err(), "ranking pass should still be running");

        let persisted = store.persisted().await;
        assert!(persisted.len() < 6);
        assert!(persisted
            .iter()
            .all(|(_, score, feedback)| *score == 1 && feedback == "table:low"));

        // aborted tasks never write afterwards
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.persisted().await, persisted);

        for record in store.snapshot().await {
            let untouched = record.score == 0 && record.feedback.is_empty();
            let complete = record.score == 1 && record.feedback == "table:low";
            assert!(untouched || complete, "candidate {} half written", record.id);
        }
    }

    #[tokio::test]
    async fn test_rank_all_with_local_provider_is_idempotent() {
        let candidates = vec![
            cv(1, Some("Data engineer, Spark and Airflow, 2016 - present")),
            cv(2, Some("Frontend developer, React, Jan 2021 to Jan 2023")),
            cv(3, Some("Spark pipelines and Airflow DAGs, 2012 to 2015")),
        ];
        let jd = "Data engineer with Spark and Airflow experience";
        let store = Arc::new(InMemoryCandidateStore::new(candidates.clone()));
        let provider: Arc<dyn AnalysisProvider> =
            Arc::new(LocalHeuristicProvider::with_reference_date(today()));
        let engine = RankingEngine::new(2);

        let first = engine
            .rank_all(candidates.clone(), jd, Arc::clone(&provider), store.clone())
            .await;
        let second = engine.rank_all(candidates, jd, provider, store).await;

        assert_eq!(first, second);
        assert_eq!(first[0].id, 1);
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
