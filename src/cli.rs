//! Command-line interface definitions for Awful News Brief.
//!
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Awful News Brief application.
///
/// # Examples
///
/// ```sh
/// # Write today's brief
/// awful_news_brief -o ./briefs/latest.json
///
/// # Use a different source catalogue and keep the digest the model saw
/// awful_news_brief -o ./latest.json -s ./sources.yaml --digest-output ./digest.txt
///
/// # Only fetch and print the digest
/// awful_news_brief --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the JSON brief (overwritten every run)
    #[arg(short, long, env = "BRIEF_OUTPUT", required_unless_present = "dry_run")]
    pub output: Option<PathBuf>,

    /// YAML source catalogue; the built-in catalogue is used when omitted
    #[arg(short, long, env = "BRIEF_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Path to the LLM client config.yaml; defaults to the awful_aj config directory
    #[arg(short, long, env = "BRIEF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the chat template holding the brief instructions
    #[arg(short, long, env = "BRIEF_TEMPLATE", default_value = "daily_brief")]
    pub template: String,

    /// Also write the rendered digest sent to the model to this file
    #[arg(long)]
    pub digest_output: Option<PathBuf>,

    /// Number of sources fetched at once (1 = one after another)
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Characters kept from each article summary
    #[arg(long, default_value_t = crate::sources::SUMMARY_BUDGET)]
    pub summary_chars: usize,

    /// Fetch and render only: print the digest, skip the model call and JSON output
    #[arg(long)]
    pub dry_run: bool,

    /// Currents API key
    #[arg(long, env = "CURRENTS_API_KEY")]
    pub currents_api_key: Option<String>,
}
