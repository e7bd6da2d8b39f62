use serde::{Deserialize, Serialize};

/// Point weights for keyword+experience ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub points_per_keyword: i32,
    pub base_experience_points: i32,
    pub points_per_extra_year: i32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_keyword: 10,
            base_experience_points: 20,
            points_per_extra_year: 5,
        }
    }
}
