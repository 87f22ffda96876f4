// API models: typed views of the JSON the Meme Market API returns.
//
// These are read-only to this crate. Every model is validated once at the
// decode boundary (see `endpoints`), so renderers never need fallback
// defaults for missing or out-of-range fields.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A post the prediction service expects to go viral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "reddit_id")]
    pub id: String,
    pub title: String,
    /// Subreddit the post was collected from.
    #[serde(rename = "subreddit")]
    pub source_community: String,
    /// Upvote score at collection time.
    #[serde(rename = "score")]
    pub raw_score: i64,
    /// Externally computed, 0–100.
    pub virality_score: f64,
    #[serde(rename = "num_comments")]
    pub comment_count: u64,
    /// 0–1.
    pub upvote_ratio: f64,
    #[serde(rename = "created_utc", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub permalink: String,
}

impl Prediction {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_percent("virality_score", self.virality_score)?;
        check_range("upvote_ratio", self.upvote_ratio, 0.0, 1.0)?;
        Ok(())
    }

    /// Link to the post on Reddit.
    pub fn url(&self) -> String {
        if self.permalink.starts_with("http") {
            self.permalink.clone()
        } else {
            format!("https://reddit.com{}", self.permalink)
        }
    }
}

/// Coarse trend classification supplied by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendingFactor {
    Low,
    Medium,
    High,
}

impl<'de> Deserialize<'de> for TrendingFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(TrendingFactor::Low),
            "MEDIUM" => Ok(TrendingFactor::Medium),
            "HIGH" => Ok(TrendingFactor::High),
            other => Err(serde::de::Error::custom(format!(
                "unknown trending_factor `{other}`, expected LOW, MEDIUM or HIGH"
            ))),
        }
    }
}

impl fmt::Display for TrendingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendingFactor::Low => "LOW",
            TrendingFactor::Medium => "MEDIUM",
            TrendingFactor::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// AI verdict on whether a meme will go viral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub will_go_viral: bool,
    pub confidence: f64,
    pub virality_score: f64,
    pub reasoning: String,
    pub trending_factor: TrendingFactor,
    pub predicted_peak_score: i64,
    pub key_trends: Vec<String>,
}

impl AnalysisResult {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_percent("confidence", self.confidence)?;
        check_percent("virality_score", self.virality_score)?;
        Ok(())
    }
}

/// Request body for `POST /perplexity/analyze-meme`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemeAnalysisRequest {
    pub title: String,
    pub subreddit: String,
    pub score: i64,
    pub num_comments: u64,
    pub age_hours: f64,
}

impl MemeAnalysisRequest {
    /// A request for `title` with the API's own defaults for everything else.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subreddit: "memes".to_string(),
            score: 0,
            num_comments: 0,
            age_hours: 0.0,
        }
    }
}

/// Projected performance of one piece of content on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: String,
    pub virality_score: f64,
    pub confidence: f64,
    /// Display string such as "350K".
    pub predicted_reach: String,
    pub best_time: String,
    pub key_factors: Vec<String>,
}

impl PlatformResult {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_percent("virality_score", self.virality_score)?;
        check_percent("confidence", self.confidence)?;
        Ok(())
    }
}

/// A topic trending across the web right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendTopic {
    pub topic: String,
    pub trend_score: f64,
    pub platforms: Vec<String>,
    pub description: String,
}

/// Payload of `GET /perplexity/trending-now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopics {
    pub trending_topics: Vec<TrendTopic>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl TrendingTopics {
    pub(crate) fn validate(&self) -> Result<(), String> {
        for topic in &self.trending_topics {
            check_percent("trend_score", topic.trend_score)?;
        }
        Ok(())
    }
}

/// Post collection status reported by `GET /reddit/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStatus {
    pub total_posts: u64,
    pub last_collection: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Acknowledgement from `POST /reddit/collect`. Collection itself runs out
/// of band on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionAck {
    pub message: String,
}

/// Payload of `GET /health/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub database: String,
}

impl HealthReport {
    pub fn database_connected(&self) -> bool {
        self.database == "connected"
    }
}

fn check_percent(field: &str, value: f64) -> Result<(), String> {
    check_range(field, value, 0.0, 100.0)
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{field} {value} outside [{min}, {max}]"));
    }
    Ok(())
}

/// Accept RFC 3339 timestamps, or naive ISO datetimes which the API emits
/// in UTC.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp `{raw}`"))
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
