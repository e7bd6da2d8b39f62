//! Keyword presence scoring.

/// Awards `points_per_keyword` for every keyword that appears at least once in
/// `text_lower`. Repeated occurrences in the text add nothing; repeated keywords
/// in the list are each counted. Blank keywords never match.
pub fn score_keywords(text_lower: &str, keywords: &[String], points_per_keyword: i32) -> i32 {
    keywords
        .iter()
        .map(|kw| kw.trim())
        .filter(|kw| !kw.is_empty())
        .filter(|kw| text_lower.contains(&kw.to_lowercase()))
        .fold(0i32, |total, _| total.saturating_add(points_per_keyword))
}
