// Output formatting: terminal rendering of view states.

pub mod terminal;

use crate::api::models::Prediction;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..120]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like emoji or accented letters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Dashboard search: keep predictions whose title or community contains
/// `query`, ignoring case. An empty query keeps everything.
pub fn filter_predictions<'a>(predictions: &'a [Prediction], query: &str) -> Vec<&'a Prediction> {
    let needle = query.trim().to_lowercase();
    predictions
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.title.to_lowercase().contains(&needle)
                || p.source_community.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Clamp a 0–100 score for display.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Color band a displayed score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    /// ≥80 is High, ≥60 Medium, anything else Low.
    pub fn from_score(score: f64) -> Self {
        match clamp_score(score) {
            s if s >= 80.0 => ScoreBand::High,
            s if s >= 60.0 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}
