use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use percent_encoding::percent_decode_str;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::request::{Method, RequestDescriptor};
use crate::api::traits::{FetchExecutor, FetchFailure, FetchOutcome};

const TITLES: &[&str] = &[
    "When the code works on the first try",
    "Nobody: / Absolutely nobody: / My cat at 3am",
    "POV: you said 'quick question' in the team chat",
    "Me explaining my weekend plans to my bank account",
    "The duality of man",
    "My last brain cell during the exam",
    "Distracted boyfriend but it's side projects",
    "This is fine (production edition)",
];

const SUBREDDITS: &[&str] = &["memes", "dankmemes", "me_irl", "wholesomememes", "ProgrammerHumor"];

const TRENDS: &[&str] = &[
    "AI-generated art",
    "Relatable work humor",
    "Pet content",
    "Gaming nostalgia",
    "Sports upsets",
    "Reaction templates",
];

const PLATFORMS: &[&str] = &["reddit", "twitter", "tiktok", "instagram"];

/// (id, display name) for the platform comparison.
const COMPARE_PLATFORMS: &[(&str, &str)] = &[
    ("reddit", "Reddit"),
    ("twitter", "Twitter/X"),
    ("tiktok", "TikTok"),
    ("instagram", "Instagram"),
];

const POSTING_TIMES: &[&str] = &[
    "Morning (8-10 AM)",
    "Afternoon (12-2 PM)",
    "Evening (6-9 PM)",
    "Night (10 PM-12 AM)",
];

/// Fake FetchExecutor that answers every known endpoint with random but
/// well-formed JSON.
pub struct DemoExecutor {
    rng: Mutex<StdRng>,
    latency: Duration,
}

impl DemoExecutor {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Reproducible responses for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency: Duration::ZERO,
        }
    }

    /// Delay every response, to make loading states visible.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn respond(&self, request: &RequestDescriptor) -> FetchOutcome {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let limit = |default: usize| {
            request
                .query_value("limit")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(default)
        };

        let json = match (request.method(), request.endpoint()) {
            (Method::Get, "/predictions/top") => {
                let n = limit(10);
                json!({
                    "success": true,
                    "count": n,
                    "predictions": fake_predictions(&mut rng, n, None),
                })
            }
            (Method::Get, "/predictions/trending") => json!({
                "success": true,
                "count": 20,
                "trending": fake_predictions(&mut rng, 20, None),
            }),
            (Method::Get, path) if path.starts_with("/predictions/subreddit/") => {
                let name = percent_decode_str(path.trim_start_matches("/predictions/subreddit/"))
                    .decode_utf8_lossy()
                    .into_owned();
                let name = name.as_str();
                let n = limit(10);
                json!({
                    "success": true,
                    "subreddit": name,
                    "count": n,
                    "predictions": fake_predictions(&mut rng, n, Some(name)),
                })
            }
            (Method::Post, "/perplexity/analyze-meme") => {
                let title = request
                    .body()
                    .and_then(|b| b.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                json!({
                    "success": true,
                    "analysis": fake_analysis(&mut rng, title),
                    "message": "Analysis complete",
                })
            }
            (Method::Post, "/compare/platforms") => json!({
                "success": true,
                "results": fake_platform_results(&mut rng),
            }),
            (Method::Get, "/perplexity/trending-now") => json!({
                "success": true,
                "trending": {
                    "trending_topics": fake_topics(&mut rng),
                    "timestamp": Utc::now().to_rfc3339(),
                },
                "message": "Trending topics retrieved",
            }),
            (Method::Get, "/reddit/status") => {
                let last = Utc::now() - ChronoDuration::minutes(rng.random_range(1..60));
                json!({
                    "success": true,
                    "status": {
                        "total_posts": rng.random_range(1_000..50_000),
                        "last_collection": last.to_rfc3339(),
                        "status": "active",
                    },
                })
            }
            (Method::Post, "/reddit/collect") => json!({
                "success": true,
                "message": "Collection started in background",
            }),
            (Method::Get, "/health/") => json!({
                "status": "healthy",
                "database": "connected",
            }),
            _ => {
                debug!(request = %request, "Demo backend has no such endpoint");
                return FetchOutcome::Failure(FetchFailure::NonSuccessStatus(404));
            }
        };

        FetchOutcome::Success { status: 200, json }
    }
}

impl Default for DemoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchExecutor for DemoExecutor {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return FetchOutcome::Failure(FetchFailure::Cancelled),
                _ = tokio::time::sleep(self.latency) => {}
            }
        }
        if cancel.is_cancelled() {
            return FetchOutcome::Failure(FetchFailure::Cancelled);
        }
        self.respond(request)
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn fake_predictions(rng: &mut StdRng, count: usize, subreddit: Option<&str>) -> Vec<Value> {
    let mut posts: Vec<Value> = (0..count)
        .map(|i| {
            let sub = subreddit.unwrap_or_else(|| pick(rng, SUBREDDITS));
            let id = format!("demo{i:03}{}", rng.random_range(100..1000));
            let age = ChronoDuration::minutes(rng.random_range(5..360));
            json!({
                "reddit_id": id,
                "title": pick(rng, TITLES),
                "subreddit": sub,
                "score": rng.random_range(50..25_000),
                "virality_score": (rng.random_range(0.0..100.0_f64) * 100.0).round() / 100.0,
                "num_comments": rng.random_range(0..3_000),
                "upvote_ratio": (rng.random_range(0.5..1.0_f64) * 100.0).round() / 100.0,
                "created_utc": (Utc::now() - age).to_rfc3339(),
                "permalink": format!("/r/{sub}/comments/{id}/"),
            })
        })
        .collect();

    posts.sort_by(|a, b| {
        let score = |v: &Value| v["virality_score"].as_f64().unwrap_or(0.0);
        score(b).total_cmp(&score(a))
    });
    posts
}

fn fake_analysis(rng: &mut StdRng, title: &str) -> Value {
    let virality: f64 = rng.random_range(20.0..95.0);
    let factor = match virality {
        v if v >= 75.0 => "HIGH",
        v if v >= 50.0 => "MEDIUM",
        _ => "LOW",
    };
    let trends: Vec<&str> = (0..3).map(|_| pick(rng, TRENDS)).collect();
    json!({
        "will_go_viral": virality >= 60.0,
        "confidence": rng.random_range(60..95),
        "virality_score": virality.round(),
        "reasoning": format!(
            "Demo analysis of \"{title}\": the format matches content currently circulating, \
             but these numbers are randomly generated."
        ),
        "trending_factor": factor,
        "predicted_peak_score": rng.random_range(1_000..80_000),
        "key_trends": trends,
    })
}

fn fake_platform_results(rng: &mut StdRng) -> Vec<Value> {
    let mut results: Vec<(u32, Value)> = COMPARE_PLATFORMS
        .iter()
        .map(|&(id, name)| {
            let score: u32 = rng.random_range(60..90);
            let first = if id == "reddit" {
                "Strong community engagement"
            } else {
                "High visual appeal"
            };
            let second = if id == "tiktok" {
                "Trending audio"
            } else {
                "Relevant hashtags"
            };
            let result = json!({
                "platform": name,
                "virality_score": score,
                "confidence": rng.random_range(70..90),
                "predicted_reach": format!("{}K", rng.random_range(100..600)),
                "best_time": pick(rng, POSTING_TIMES),
                "key_factors": [first, second, "Timing is optimal"],
            });
            (score, result)
        })
        .collect();
    results.sort_by(|a, b| b.0.cmp(&a.0));
    results.into_iter().map(|(_, result)| result).collect()
}

fn fake_topics(rng: &mut StdRng) -> Vec<Value> {
    TRENDS
        .iter()
        .map(|topic| {
            let mut platforms: Vec<&str> = PLATFORMS
                .iter()
                .copied()
                .filter(|_| rng.random_bool(0.5))
                .collect();
            if platforms.is_empty() {
                platforms.push("reddit");
            }
            json!({
                "topic": topic,
                "trend_score": rng.random_range(30..100),
                "platforms": platforms,
                "description": format!("{topic} is picking up across social feeds"),
            })
        })
        .collect()
}
