#![allow(dead_code)]

//! Offline heuristic analysis: job-description word overlap plus detected experience.
//!
//! Algorithm:
//! 1. Split the lower-cased job description on runs of non-word characters.
//! 2. Count tokens longer than 4 characters that appear in the CV text.
//! 3. match_rate = matches / total tokens (short tokens and a leading empty
//!    token included in the denominator, trailing empty tokens dropped)
//! 4. score = round(match_rate × 75 + min(years, 5) × 5)
//!
//! The denominator counts every token, not just the meaningful ones. Band
//! thresholds below are calibrated against that formula.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis::{AnalysisBackend, AnalysisProvider, AnalysisResult};
use crate::ranking::experience::estimate_years_as_of;

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("token separator pattern is valid"));

const MIN_MEANINGFUL_LEN: usize = 5;
const MATCH_WEIGHT: f64 = 75.0;
const MAX_EXPERIENCE_YEARS: u32 = 5;
const POINTS_PER_YEAR: f64 = 5.0;

/// Qualitative band reported alongside a local score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBand {
    Excellent,
    Good,
    Average,
    BelowAverage,
}

impl MatchBand {
    pub fn from_score(score: i32) -> Self {
        if score > 80 {
            MatchBand::Excellent
        } else if score > 60 {
            MatchBand::Good
        } else if score > 40 {
            MatchBand::Average
        } else {
            MatchBand::BelowAverage
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            MatchBand::Excellent => {
                "Excellent match for the position. Strong skills alignment with job requirements."
            }
            MatchBand::Good => "Good match for the position. Covers most of the required skills.",
            MatchBand::Average => {
                "Average match. Some skills align, but there are gaps in experience."
            }
            MatchBand::BelowAverage => {
                "Below average match. Significant gaps between CV and job requirements."
            }
        }
    }
}

/// Deterministic, network-free provider. `present` in date ranges resolves to
/// the pinned reference date when one is set, otherwise to today's UTC date.
#[derive(Debug, Clone, Default)]
pub struct LocalHeuristicProvider {
    reference_date: Option<NaiveDate>,
}

impl LocalHeuristicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_date(date: NaiveDate) -> Self {
        Self {
            reference_date: Some(date),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[async_trait]
impl AnalysisProvider for LocalHeuristicProvider {
    async fn analyze(&self, cv_text: &str, job_description: &str) -> AnalysisResult {
        analyze_locally(cv_text, job_description, self.today())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Share of job-description tokens that are meaningful and present in the CV.
/// Zero when the description yields no tokens.
pub fn match_rate(cv_text: &str, job_description: &str) -> f64 {
    let cv_lower = cv_text.to_lowercase();
    let jd_lower = job_description.to_lowercase();

    // a leading separator yields an empty first token that still counts;
    // trailing empty tokens do not
    let mut tokens: Vec<&str> = NON_WORD_RE.split(&jd_lower).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    if tokens.is_empty() {
        return 0.0;
    }

    let matches = tokens
        .iter()
        .filter(|t| t.len() >= MIN_MEANINGFUL_LEN && cv_lower.contains(**t))
        .count();

    matches as f64 / tokens.len() as f64
}

pub fn analyze_locally(cv_text: &str, job_description: &str, today: NaiveDate) -> AnalysisResult {
    let rate = match_rate(cv_text, job_description);
    let years = estimate_years_as_of(cv_text, today);

    let experience_points = years.min(MAX_EXPERIENCE_YEARS) as f64 * POINTS_PER_YEAR;
    let score = (rate * MATCH_WEIGHT + experience_points).round() as i32;

    let feedback = format!(
        "CV Analysis Feedback:\nKeyword match rate: {:.1}%\nExperience detected: {} years\n\n{}",
        rate * 100.0,
        years,
        MatchBand::from_score(score).summary()
    );

    AnalysisResult {
        score,
        feedback,
        backend: AnalysisBackend::Local,
    }
}
