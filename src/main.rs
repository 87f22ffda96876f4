use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use meme_market::api::client::HttpExecutor;
use meme_market::api::endpoints;
use meme_market::api::models::{MemeAnalysisRequest, Prediction};
use meme_market::api::request::RequestDescriptor;
use meme_market::api::traits::FetchExecutor;
use meme_market::config::{Backend, Config};
use meme_market::demo::executor::DemoExecutor;
use meme_market::output::terminal;
use meme_market::polling::scheduler::PollingScheduler;
use meme_market::view::controller::{Decoder, Snapshot, ViewController};
use meme_market::view::state::ViewState;

/// Meme Market: see which posts are about to go viral.
///
/// Talks to the Meme Market API (set MEME_MARKET_API_URL) or, with --demo,
/// to a built-in fake backend.
#[derive(Parser)]
#[command(name = "meme-market", version, about)]
struct Cli {
    /// Use fabricated demo data instead of the API
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the posts most likely to go viral
    Top {
        /// Number of predictions to fetch (default: 10)
        #[arg(long, default_value = "10")]
        limit: u32,

        /// Only show posts whose title or subreddit contains this text
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Show trending posts from the last N hours
    Trending {
        /// Look-back window in hours (default: 24)
        #[arg(long, default_value = "24")]
        hours: u32,
    },

    /// Show predictions for a single subreddit
    Subreddit {
        /// Subreddit name (with or without the r/ prefix)
        name: String,

        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Ask the AI analyzer whether a meme will go viral
    Analyze {
        /// The meme's title or caption
        title: String,

        #[arg(long, default_value = "memes")]
        subreddit: String,

        /// Current upvote score
        #[arg(long, default_value = "0")]
        score: i64,

        /// Current comment count
        #[arg(long, default_value = "0")]
        comments: u64,

        /// Hours since posting
        #[arg(long, default_value = "0")]
        age_hours: f64,
    },

    /// Compare how one piece of content would do on each platform
    Compare {
        /// The meme, video idea or post text
        content: String,
    },

    /// Show topics trending across the web right now
    TrendingNow,

    /// Show post collection status
    Status,

    /// Ask the API to start collecting fresh posts
    Collect,

    /// Check that the API is reachable
    Health,

    /// Live dashboard: refresh top predictions on an interval until Ctrl-C
    Watch {
        /// Refresh period in milliseconds (default: MEME_MARKET_POLL_INTERVAL_MS or 120000)
        #[arg(long)]
        interval_ms: Option<u64>,

        #[arg(long, default_value = "10")]
        limit: u32,

        /// Only show posts whose title or subreddit contains this text
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so rendered views own stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("meme_market=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.demo {
        config.backend = Backend::Demo;
    }
    let executor = create_executor(&config)?;

    let failed = match cli.command {
        Commands::Top { limit, search } => {
            let state = fetch_once(
                &executor,
                endpoints::top_predictions(limit),
                endpoints::decode_predictions,
            )
            .await;
            terminal::display_predictions(&state, "Top Predictions", &search);
            state.failure().is_some()
        }

        Commands::Trending { hours } => {
            let state = fetch_once(
                &executor,
                endpoints::trending_predictions(hours),
                endpoints::decode_trending,
            )
            .await;
            terminal::display_predictions(&state, &format!("Trending (last {hours}h)"), "");
            state.failure().is_some()
        }

        Commands::Subreddit { name, limit } => {
            let descriptor = endpoints::subreddit_predictions(&name, limit)?;
            let state = fetch_once(&executor, descriptor, endpoints::decode_predictions).await;
            let heading = format!("r/{}", name.trim_start_matches("r/"));
            terminal::display_predictions(&state, &heading, "");
            state.failure().is_some()
        }

        Commands::Analyze {
            title,
            subreddit,
            score,
            comments,
            age_hours,
        } => {
            let request = MemeAnalysisRequest {
                title: title.clone(),
                subreddit,
                score,
                num_comments: comments,
                age_hours,
            };
            let descriptor = endpoints::analyze_meme(&request)?;
            let state = fetch_once(&executor, descriptor, endpoints::decode_analysis).await;
            terminal::display_analysis(&state, &title);
            state.failure().is_some()
        }

        Commands::Compare { content } => {
            let descriptor = endpoints::compare_platforms(&content)?;
            let state = fetch_once(
                &executor,
                descriptor,
                endpoints::decode_platform_comparison,
            )
            .await;
            terminal::display_platform_comparison(&state, content.trim());
            state.failure().is_some()
        }

        Commands::TrendingNow => {
            let state = fetch_once(
                &executor,
                endpoints::trending_now(),
                endpoints::decode_trending_topics,
            )
            .await;
            terminal::display_trend_topics(&state);
            state.failure().is_some()
        }

        Commands::Status => {
            let state = fetch_once(
                &executor,
                endpoints::collection_status(),
                endpoints::decode_collection_status,
            )
            .await;
            terminal::display_collection_status(&state);
            state.failure().is_some()
        }

        Commands::Collect => {
            println!("Requesting post collection...");
            let state = fetch_once(
                &executor,
                endpoints::start_collection(),
                endpoints::decode_collection_ack,
            )
            .await;
            terminal::display_collection_ack(&state);
            if state.data().is_some() {
                println!(
                    "{}",
                    "Collection runs in the background. Check progress with `meme-market status`."
                        .dimmed()
                );
            }
            state.failure().is_some()
        }

        Commands::Health => {
            let state = fetch_once(&executor, endpoints::health(), endpoints::decode_health).await;
            let origin = match config.backend {
                Backend::Http => config.api_url.as_str(),
                Backend::Demo => "demo",
            };
            terminal::display_health(&state, origin);
            state.failure().is_some()
        }

        Commands::Watch {
            interval_ms,
            limit,
            search,
        } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or(config.poll_interval);
            watch_dashboard(executor, interval, limit, &search).await?;
            false
        }
    };

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Build the executor for the configured backend.
fn create_executor(config: &Config) -> Result<Arc<dyn FetchExecutor>> {
    match config.backend {
        Backend::Http => {
            config.require_api_url()?;
            info!(api_url = %config.api_url, "Using Meme Market API");
            Ok(Arc::new(HttpExecutor::new(
                &config.api_url,
                config.request_timeout,
            )?))
        }
        Backend::Demo => {
            info!("Using demo backend, results are fabricated");
            Ok(Arc::new(
                DemoExecutor::new().with_latency(Duration::from_millis(400)),
            ))
        }
    }
}

/// Run a single request through a fresh controller, with a spinner while
/// it's loading, and return the settled state.
async fn fetch_once<T>(
    executor: &Arc<dyn FetchExecutor>,
    request: RequestDescriptor,
    decode: Decoder<T>,
) -> ViewState<T>
where
    T: Clone + Send + Sync + 'static,
{
    let controller = ViewController::new(Arc::clone(executor), decode);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(request.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    controller.trigger(request).settled().await;

    spinner.finish_and_clear();
    let state = controller.state();
    controller.teardown();
    state
}

/// Poll top predictions and re-render on every state change until Ctrl-C.
async fn watch_dashboard(
    executor: Arc<dyn FetchExecutor>,
    interval: Duration,
    limit: u32,
    search: &str,
) -> Result<()> {
    let controller: ViewController<Vec<Prediction>> =
        ViewController::new(executor, endpoints::decode_predictions);
    let mut updates = controller.subscribe();

    let polling = PollingScheduler::new(controller.clone(), interval)?
        .start(move || endpoints::top_predictions(limit));

    println!(
        "{}",
        format!(
            "Refreshing every {}s. Press Ctrl-C to stop.",
            interval.as_secs_f64()
        )
        .dimmed()
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render_dashboard(&snapshot, search);
            }
        }
    }

    polling.stop().await;
    controller.teardown();
    println!("\n{}", "Dashboard stopped.".dimmed());
    Ok(())
}

fn render_dashboard(snapshot: &Snapshot<Vec<Prediction>>, search: &str) {
    match &snapshot.state {
        // Keep the last table on screen while a refresh is in flight
        ViewState::Loading => println!(
            "\n  {}",
            format!("Refreshing (#{})...", snapshot.generation).dimmed()
        ),
        state => {
            let heading = format!(
                "Live Predictions ({})",
                chrono::Local::now().format("%H:%M:%S")
            );
            terminal::display_predictions(state, &heading, search);
        }
    }
}
