//! # Awful News Brief
//!
//! A once-a-day job that gathers headlines from keyword search APIs and RSS
//! feeds, renders them into one text digest grouped by category, asks an LLM
//! to write a brief from it, and stores the result as JSON.
//!
//! ## Usage
//!
//! ```sh
//! awful_news_brief -o ./briefs/latest.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalogue**: Load the ordered categories and sources (`sources.yaml`)
//! 2. **Fetching**: Poll each source once; failures yield no articles and never stop the run
//! 3. **Rendering**: Concatenate articles into a fixed-format digest, one section per category
//! 4. **Generation**: Send the digest to the LLM (retried with backoff)
//! 5. **Output**: Overwrite the JSON brief `{date, generated_at, content}`

use awful_aj::{config, config_dir, template};
use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod catalogue;
mod cli;
mod error;
mod models;
mod outputs;
mod sources;
mod utils;

use aggregator::{fetch_all, render_digest};
use api::ask_with_backoff;
use cli::Cli;
use models::DailyBrief;
use outputs::{json, text};
use sources::Fetcher;
use utils::{ensure_writable_dir, parent_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_news_brief starting up");

    let args = Cli::parse();
    debug!(?args.output, ?args.sources, concurrency = args.concurrency, dry_run = args.dry_run, "Parsed CLI arguments");

    // Fail before any network work if the brief can't be written
    if let (false, Some(output)) = (args.dry_run, args.output.as_deref()) {
        let dir = parent_dir(output);
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Fetch and render ----
    let catalogue = catalogue::load(args.sources.as_deref()).await?;
    let fetcher = Fetcher::new(args.summary_chars, args.currents_api_key.clone())?;
    let digests = fetch_all(&fetcher, &catalogue, args.concurrency).await;

    let total_articles: usize = digests.iter().map(|d| d.article_count()).sum();
    let failed: Vec<String> = digests
        .iter()
        .flat_map(|d| d.failed_sources())
        .filter_map(|r| {
            r.outcome
                .error()
                .map(|e| format!("{} ({:?}): {}", r.label, r.kind, e))
        })
        .collect();
    info!(
        articles = total_articles,
        sources = catalogue.source_count(),
        failed_sources = failed.len(),
        ?failed,
        "Fetching completed"
    );

    let digest = render_digest(&digests);
    if let Some(path) = &args.digest_output {
        text::write_digest(&digest, path).await?;
    }

    if args.dry_run {
        println!("{digest}");
        info!(elapsed_ms = start_time.elapsed().as_millis(), "Dry run complete");
        return Ok(());
    }
    let output = args
        .output
        .as_deref()
        .ok_or("--output is required unless --dry-run is set")?;

    // ---- Load template & config ----
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let conf_file = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = conf_file
        .to_str()
        .ok_or("config path is not valid UTF-8")?;
    let config = config::load_config(config_path)
        .map_err(|e| format!("failed to load {config_path}: {e}"))?;
    info!(config_path, "Loaded configuration");

    // ---- Generate ----
    let date = Local::now().date_naive().to_string();
    let content = ask_with_backoff(&config, &template, &date, &digest).await?;
    debug!(preview = %truncate_for_log(&content, 300), "Model response");

    let brief = DailyBrief::new(content, Local::now());
    json::write_brief(&brief, output).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        path = %output.display(),
        "Execution complete"
    );
    Ok(())
}
