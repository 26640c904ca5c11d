//! Source fetchers for search APIs and RSS feeds.
//!
//! Every source goes through the same pipeline:
//!
//! 1. **Fetch**: one or more HTTP GETs with the descriptor's timeout
//! 2. **Parse**: decode the JSON hits or RSS items into [`Candidate`]s, with
//!    missing fields falling back to empty strings
//! 3. **Normalize**: drop candidates without a title or URL, truncate
//!    summaries, keep the first `max_items`
//!
//! Any error along the way turns into [`SourceOutcome::Failed`] for that
//! source alone. Sources are attempted exactly once per run.
//!
//! # Supported Sources
//!
//! | Kind | Module | Payload |
//! |------|--------|---------|
//! | `hacker_news` | [`hacker_news`] | Algolia search JSON (`hits`) |
//! | `currents` | [`currents`] | Currents search JSON (`news`) |
//! | `rss` | [`rss`] | RSS 2.0 or RDF `<item>` elements |

pub mod currents;
pub mod hacker_news;
pub mod rss;

use crate::catalogue::{SourceDescriptor, SourceKind};
use crate::error::FetchError;
use crate::models::{Article, SourceOutcome};
use crate::utils::{collapse_whitespace, truncate_chars};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use url::Url;

/// Default number of characters kept from a summary.
pub const SUMMARY_BUDGET: usize = 200;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, */*";

/// A raw item pulled out of a payload before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
    pub score: Option<i64>,
}

/// Turn raw candidates into articles.
///
/// A candidate survives only if its title and URL are non-empty after
/// trimming. Every field is flattened to a single line so the rendered
/// `Title:`/`URL:` records stay intact. Summaries are cut to
/// `summary_budget` characters.
/// The cap applies after filtering, keeping the first `max_items` in order.
pub fn normalize<I>(candidates: I, max_items: usize, summary_budget: usize) -> Vec<Article>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .filter_map(|c| {
            let title = collapse_whitespace(&c.title);
            let url = collapse_whitespace(&c.url);
            if title.is_empty() || url.is_empty() {
                return None;
            }
            let summary = truncate_chars(&collapse_whitespace(&c.summary), summary_budget);
            Some(Article {
                title,
                url,
                source: collapse_whitespace(&c.source),
                published_at: collapse_whitespace(&c.published_at),
                summary: (!summary.is_empty()).then_some(summary),
                score: c.score,
            })
        })
        .take(max_items)
        .collect()
}

/// Shared HTTP client plus the per-run knobs every source needs.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    summary_budget: usize,
    currents_api_key: Option<String>,
}

impl Fetcher {
    pub fn new(summary_budget: usize, currents_api_key: Option<String>) -> Result<Self, FetchError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            summary_budget,
            currents_api_key,
        })
    }

    pub fn summary_budget(&self) -> usize {
        self.summary_budget
    }

    pub fn currents_api_key(&self) -> Option<&str> {
        self.currents_api_key.as_deref()
    }

    /// Poll one source. Never fails: errors become [`SourceOutcome::Failed`].
    #[instrument(level = "info", skip_all, fields(source = %descriptor.label))]
    pub async fn fetch(&self, descriptor: &SourceDescriptor) -> SourceOutcome {
        let t0 = Instant::now();
        let res = match descriptor.kind {
            SourceKind::HackerNews => hacker_news::fetch(self, descriptor).await,
            SourceKind::Currents => currents::fetch(self, descriptor).await,
            SourceKind::Rss => rss::fetch(self, descriptor).await,
        };
        let elapsed_ms = t0.elapsed().as_millis();

        match &res {
            Ok(articles) => info!(
                source = %descriptor.label,
                count = articles.len(),
                elapsed_ms,
                "Fetched source"
            ),
            Err(e) => warn!(
                source = %descriptor.label,
                error = %e,
                elapsed_ms,
                "Source fetch failed; contributing no articles"
            ),
        }
        res.into()
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// `browser` adds the header set feed providers expect from a real
    /// browser; several reject default client identifiers.
    pub(crate) async fn get_text(
        &self,
        url: Url,
        timeout: Duration,
        browser: bool,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url).timeout(timeout);
        if browser {
            request = request.headers(browser_headers());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}
