// Colored terminal output for each view.
//
// Every render function takes the whole ViewState, so callers don't branch
// on loading/error themselves. Idle renders nothing.

use chrono::Utc;
use colored::{ColoredString, Colorize};

use super::{clamp_score, filter_predictions, truncate_chars, ScoreBand};
use crate::api::models::{
    AnalysisResult, CollectionAck, CollectionStatus, HealthReport, PlatformResult, Prediction,
    TrendingFactor, TrendingTopics,
};
use crate::view::state::ViewState;

/// Shared Idle/Loading/Failure handling. Returns the data on Success.
fn settled<'a, T>(state: &'a ViewState<T>, what: &str) -> Option<&'a T> {
    match state {
        ViewState::Idle => None,
        ViewState::Loading => {
            println!("  {}", format!("Loading {what}...").dimmed());
            None
        }
        ViewState::Failure { reason } => {
            println!("  {} {}", "Error:".red().bold(), reason);
            println!("  {}", "Run the command again to retry.".dimmed());
            None
        }
        ViewState::Success { data } => Some(data),
    }
}

/// Color a 0–100 score by band.
pub fn colorize_score(score: f64) -> ColoredString {
    let text = format!("{:>5.1}", clamp_score(score));
    match ScoreBand::from_score(score) {
        ScoreBand::High => text.green().bold(),
        ScoreBand::Medium => text.yellow(),
        ScoreBand::Low => text.normal(),
    }
}

fn colorize_factor(factor: TrendingFactor) -> ColoredString {
    let text = factor.to_string();
    match factor {
        TrendingFactor::High => text.red().bold(),
        TrendingFactor::Medium => text.yellow(),
        TrendingFactor::Low => text.dimmed(),
    }
}

/// Render a prediction list, optionally filtered by a search query.
pub fn display_predictions(state: &ViewState<Vec<Prediction>>, heading: &str, search: &str) {
    println!("\n{}", format!("=== {heading} ===").bold());

    let Some(predictions) = settled(state, "predictions") else {
        return;
    };

    let shown = filter_predictions(predictions, search);
    if shown.is_empty() {
        if predictions.is_empty() {
            println!("  No predictions yet. Try `meme-market collect` to gather fresh posts.");
        } else {
            println!("  No predictions match \"{}\".", search.trim());
        }
        return;
    }

    println!(
        "  {:>4}  {:<52} {:<18} {:>5}  {:>7}  {:>6}",
        "Rank".dimmed(),
        "Title".dimmed(),
        "Subreddit".dimmed(),
        "Viral".dimmed(),
        "Score".dimmed(),
        "Age".dimmed(),
    );
    println!("  {}", "-".repeat(100).dimmed());

    for (i, p) in shown.iter().enumerate() {
        println!(
            "  {:>4}. {:<52} r/{:<16} {}  {:>7}  {:>6}",
            i + 1,
            truncate_chars(&p.title, 48),
            truncate_chars(&p.source_community, 14),
            colorize_score(p.virality_score),
            p.raw_score,
            format_age(p),
        );
    }

    if !search.trim().is_empty() {
        println!(
            "\n  {}",
            format!("{} of {} shown", shown.len(), predictions.len()).dimmed()
        );
    }
}

/// Render a full analysis verdict.
pub fn display_analysis(state: &ViewState<AnalysisResult>, title: &str) {
    println!("\n{}", format!("=== Analysis: {title} ===").bold());

    let Some(analysis) = settled(state, "analysis") else {
        return;
    };

    let verdict = if analysis.will_go_viral {
        "Likely to go viral".green().bold()
    } else {
        "Unlikely to go viral".yellow()
    };
    println!("  Verdict: {verdict}");
    println!("  Virality score: {}/100", colorize_score(analysis.virality_score));
    println!("  Confidence: {}%", colorize_score(analysis.confidence));
    println!("  Trending factor: {}", colorize_factor(analysis.trending_factor));
    println!("  Predicted peak score: {}", analysis.predicted_peak_score);

    if !analysis.key_trends.is_empty() {
        println!("\n  Key trends:");
        for trend in &analysis.key_trends {
            println!("    - {trend}");
        }
    }

    println!("\n  {}", "Reasoning:".bold());
    println!("    {}", analysis.reasoning);
}

/// Render per-platform projections, best first, with posting advice.
pub fn display_platform_comparison(state: &ViewState<Vec<PlatformResult>>, content: &str) {
    println!(
        "\n{}",
        format!("=== Platform Comparison: {} ===", truncate_chars(content, 60)).bold()
    );

    let Some(results) = settled(state, "platform comparison") else {
        return;
    };
    let Some(best) = results.first() else {
        println!("  No platforms reported.");
        return;
    };

    for (i, r) in results.iter().enumerate() {
        println!(
            "  {:>2}. {:<12} {}  confidence {:>3.0}%  reach {:>6}  {}",
            i + 1,
            r.platform.bold(),
            colorize_score(r.virality_score),
            clamp_score(r.confidence),
            r.predicted_reach,
            r.best_time.dimmed(),
        );
        if !r.key_factors.is_empty() {
            println!("      {}", r.key_factors.join(", ").dimmed());
        }
    }

    println!("\n  {}", "Recommendations:".bold());
    println!("    - Post on {} first for maximum impact", best.platform.bold());
    if let Some(runner_up) = results.get(1) {
        println!(
            "    - Cross-post to {} within 2 hours for extended reach",
            runner_up.platform
        );
    }
    println!(
        "    - Optimize timing: {} is ideal for {}",
        best.best_time, best.platform
    );
}

/// Render web-wide trending topics.
pub fn display_trend_topics(state: &ViewState<TrendingTopics>) {
    println!("\n{}", "=== Trending Across the Web ===".bold());

    let Some(topics) = settled(state, "trending topics") else {
        return;
    };

    if topics.trending_topics.is_empty() {
        println!("  No trending topics reported.");
        return;
    }

    for (i, topic) in topics.trending_topics.iter().enumerate() {
        println!(
            "  {:>2}. {}  {}  [{}]",
            i + 1,
            colorize_score(topic.trend_score),
            topic.topic.bold(),
            topic.platforms.join(", ").dimmed(),
        );
        println!("      {}", truncate_chars(&topic.description, 90));
    }

    if let Some(ts) = &topics.timestamp {
        println!("\n  {}", format!("As of {ts}").dimmed());
    }
}

/// Render the collector's status.
pub fn display_collection_status(state: &ViewState<CollectionStatus>) {
    println!("\n{}", "=== Collection Status ===".bold());

    let Some(status) = settled(state, "collection status") else {
        return;
    };

    println!("  Posts collected: {}", status.total_posts);
    match &status.last_collection {
        Some(ts) => println!("  Last collection: {ts}"),
        None => {
            println!("  Last collection: never");
            println!("    Run `meme-market collect` to start one");
        }
    }
    if let Some(s) = &status.status {
        println!("  Collector: {s}");
    }
}

/// Render the acknowledgement for a collection request.
pub fn display_collection_ack(state: &ViewState<CollectionAck>) {
    if let Some(ack) = settled(state, "collection request") {
        println!("  {} {}", "✓".green(), ack.message);
    }
}

/// Render the API health check.
pub fn display_health(state: &ViewState<HealthReport>, base_url: &str) {
    println!("\n{}", format!("=== API Health ({base_url}) ===").bold());

    let Some(report) = settled(state, "health") else {
        return;
    };

    println!("  Status: {}", report.status.green());
    if report.database_connected() {
        println!("  Database: {}", "connected".green());
    } else {
        println!("  Database: {}", report.database.red());
    }
}

/// Post age as a short human string ("12m", "3h", "2d").
fn format_age(prediction: &Prediction) -> String {
    let minutes = (Utc::now() - prediction.created_at).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 60 * 24 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / (60 * 24))
    }
}
