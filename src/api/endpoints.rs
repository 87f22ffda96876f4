// Endpoint catalogue: descriptor constructors and response decoders.
//
// Each API endpoint gets a function that builds its RequestDescriptor and a
// decoder that turns the raw JSON into a validated model. Decoders are plain
// `fn(Value) -> Result<T, FetchFailure>` so a ViewController can hold one
// without boxing.
//
// Every response may come wrapped in a `{ success, message, error }`
// envelope. `success: false` becomes ApplicationRejected; a missing or
// mistyped payload field becomes MalformedBody.

use anyhow::Result;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::models::{
    AnalysisResult, CollectionAck, CollectionStatus, HealthReport, MemeAnalysisRequest,
    PlatformResult, Prediction, TrendingTopics,
};
use super::request::RequestDescriptor;
use super::traits::FetchFailure;

/// Characters escaped when a user-supplied name becomes one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// -- Descriptors --

/// `GET /predictions/top?limit=N`
pub fn top_predictions(limit: u32) -> RequestDescriptor {
    RequestDescriptor::get("/predictions/top").with_query("limit", limit)
}

/// `GET /predictions/trending?hours=N`
pub fn trending_predictions(hours: u32) -> RequestDescriptor {
    RequestDescriptor::get("/predictions/trending").with_query("hours", hours)
}

/// `GET /predictions/subreddit/{name}?limit=N`
///
/// The name is escaped as a single path segment. Fails without issuing
/// anything if it's blank.
pub fn subreddit_predictions(subreddit: &str, limit: u32) -> Result<RequestDescriptor> {
    let name = subreddit.trim().trim_start_matches("r/").trim();
    if name.is_empty() {
        anyhow::bail!("A subreddit name is required");
    }
    let endpoint = format!(
        "/predictions/subreddit/{}",
        utf8_percent_encode(name, PATH_SEGMENT)
    );
    Ok(RequestDescriptor::get(endpoint).with_query("limit", limit))
}

/// `POST /perplexity/analyze-meme`
///
/// Fails without issuing anything if the title is blank.
pub fn analyze_meme(request: &MemeAnalysisRequest) -> Result<RequestDescriptor> {
    if request.title.trim().is_empty() {
        anyhow::bail!("A meme title is required for analysis");
    }
    let body = serde_json::to_value(request)?;
    Ok(RequestDescriptor::post("/perplexity/analyze-meme").with_body(body))
}

/// `POST /compare/platforms`
///
/// Fails without issuing anything if the content is blank.
pub fn compare_platforms(content: &str) -> Result<RequestDescriptor> {
    let content = content.trim();
    if content.is_empty() {
        anyhow::bail!("Content to compare is required");
    }
    Ok(RequestDescriptor::post("/compare/platforms").with_body(json!({ "content": content })))
}

/// `GET /perplexity/trending-now`
pub fn trending_now() -> RequestDescriptor {
    RequestDescriptor::get("/perplexity/trending-now")
}

/// `GET /reddit/status`
pub fn collection_status() -> RequestDescriptor {
    RequestDescriptor::get("/reddit/status")
}

/// `POST /reddit/collect`
pub fn start_collection() -> RequestDescriptor {
    RequestDescriptor::post("/reddit/collect")
}

/// `GET /health/`
pub fn health() -> RequestDescriptor {
    RequestDescriptor::get("/health/")
}

// -- Decoders --

/// Decode `{ predictions: Prediction[] }` (top and subreddit endpoints).
pub fn decode_predictions(json: Value) -> Result<Vec<Prediction>, FetchFailure> {
    check_envelope(&json)?;
    let predictions: Vec<Prediction> = field(json, "predictions")?;
    validate_all(&predictions)?;
    Ok(predictions)
}

/// Decode `{ trending: Prediction[] }`.
pub fn decode_trending(json: Value) -> Result<Vec<Prediction>, FetchFailure> {
    check_envelope(&json)?;
    let trending: Vec<Prediction> = field(json, "trending")?;
    validate_all(&trending)?;
    Ok(trending)
}

/// Decode `{ success, analysis?, message? }`.
pub fn decode_analysis(json: Value) -> Result<AnalysisResult, FetchFailure> {
    check_envelope(&json)?;
    let analysis: AnalysisResult = field(json, "analysis")?;
    analysis.validate().map_err(FetchFailure::MalformedBody)?;
    Ok(analysis)
}

/// Decode `{ success, results: PlatformResult[] }`, best platform first.
pub fn decode_platform_comparison(json: Value) -> Result<Vec<PlatformResult>, FetchFailure> {
    check_envelope(&json)?;
    let mut results: Vec<PlatformResult> = field(json, "results")?;
    for r in &results {
        r.validate()
            .map_err(|e| FetchFailure::MalformedBody(format!("platform {}: {e}", r.platform)))?;
    }
    results.sort_by(|a, b| b.virality_score.total_cmp(&a.virality_score));
    Ok(results)
}

/// Decode `{ success, trending?: { trending_topics } }`.
pub fn decode_trending_topics(json: Value) -> Result<TrendingTopics, FetchFailure> {
    check_envelope(&json)?;
    let topics: TrendingTopics = field(json, "trending")?;
    topics.validate().map_err(FetchFailure::MalformedBody)?;
    Ok(topics)
}

/// Decode `{ success, status?: { total_posts, last_collection } }`.
///
/// The server reports its own database errors inside `status` while still
/// saying `success: true`; those come back as ApplicationRejected.
pub fn decode_collection_status(json: Value) -> Result<CollectionStatus, FetchFailure> {
    check_envelope(&json)?;
    let inner = json
        .get("status")
        .ok_or_else(|| FetchFailure::MalformedBody("missing field `status`".to_string()))?;
    if inner.get("status").and_then(Value::as_str) == Some("error") {
        let message = inner
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Collection status unavailable");
        return Err(FetchFailure::ApplicationRejected(message.to_string()));
    }
    field(json, "status")
}

/// Decode the `{ success, message }` acknowledgement from `/reddit/collect`.
pub fn decode_collection_ack(json: Value) -> Result<CollectionAck, FetchFailure> {
    check_envelope(&json)?;
    serde_json::from_value(json).map_err(|e| FetchFailure::MalformedBody(e.to_string()))
}

/// Decode `{ status, database }` from the health endpoint.
pub fn decode_health(json: Value) -> Result<HealthReport, FetchFailure> {
    serde_json::from_value(json).map_err(|e| FetchFailure::MalformedBody(e.to_string()))
}

// -- Helpers --

/// Reject `success: false` envelopes, preferring `message` over `error`.
fn check_envelope(json: &Value) -> Result<(), FetchFailure> {
    if !json.is_object() {
        return Err(FetchFailure::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    }
    match json.get("success") {
        Some(Value::Bool(false)) => {
            let message = ["message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str))
                .unwrap_or("Request rejected by server");
            Err(FetchFailure::ApplicationRejected(message.to_string()))
        }
        Some(Value::Bool(true)) | None => Ok(()),
        Some(other) => Err(FetchFailure::MalformedBody(format!(
            "`success` should be a boolean, got {other}"
        ))),
    }
}

/// Pull `name` out of an object and deserialize it.
fn field<T: DeserializeOwned>(mut json: Value, name: &str) -> Result<T, FetchFailure> {
    let value = json
        .get_mut(name)
        .map(Value::take)
        .filter(|v| !v.is_null())
        .ok_or_else(|| FetchFailure::MalformedBody(format!("missing field `{name}`")))?;
    serde_json::from_value(value).map_err(|e| FetchFailure::MalformedBody(format!("{name}: {e}")))
}

fn validate_all(predictions: &[Prediction]) -> Result<(), FetchFailure> {
    for p in predictions {
        p.validate()
            .map_err(|e| FetchFailure::MalformedBody(format!("prediction {}: {e}", p.id)))?;
    }
    Ok(())
}
