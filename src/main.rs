use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reviewanalyzer_lib::config::{Config, MAX_REVIEWS_LIMIT};
use reviewanalyzer_lib::init::AppServices;
use reviewanalyzer_lib::services::report;

/// Collect product reviews from a shopping page, then count sentiment labels
/// and summarize them.
#[derive(Parser, Debug)]
#[command(name = "reviewanalyzer", version, about)]
struct Cli {
    /// Product page URL
    url: String,

    /// Stop after this many unique reviews
    #[arg(short = 'n', long)]
    max_reviews: Option<usize>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of review previews to print
    #[arg(long, value_name = "N")]
    previews: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reviewanalyzer=info,reviewanalyzer_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(max_reviews) = cli.max_reviews {
        config.collector.max_reviews = max_reviews.min(MAX_REVIEWS_LIMIT);
    }
    if let Some(previews) = cli.previews {
        config.report.preview_count = previews;
    }
    if cli.headful {
        config.browser.headless = false;
    }

    let max_reviews = config.collector.max_reviews;
    let preview_count = config.report.preview_count;

    let services = AppServices::initialize(config)
        .await
        .context("failed to initialize services")?;
    let pipeline = services.pipeline();

    tracing::info!(url = %cli.url, max_reviews, "starting review analysis");
    let result = pipeline.run(&cli.url, max_reviews).await;
    services.shutdown();

    let analysis = result.with_context(|| format!("could not collect reviews from {}", cli.url))?;

    if cli.json {
        println!("{}", report::render_json(&analysis)?);
    } else {
        print!("{}", report::render_text(&analysis, preview_count));
    }

    Ok(())
}
