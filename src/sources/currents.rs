//! Currents news search API.
//!
//! ```text
//! GET {endpoint}?keywords=fintech&language=en[&apiKey=...]
//! ```
//!
//! The response lists articles under `news`. Articles without an `author`
//! are attributed to [`UNKNOWN_AUTHOR`].

use super::{Candidate, Fetcher, normalize};
use crate::catalogue::SourceDescriptor;
use crate::error::FetchError;
use crate::models::Article;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

/// Source name for articles the API returns without an author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    published: Option<String>,
    description: Option<String>,
}

/// Decode one search response into candidates.
pub fn parse_news(body: &str) -> Result<Vec<Candidate>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .news
        .into_iter()
        .map(|item| Candidate {
            title: item.title.unwrap_or_default(),
            url: item.url.unwrap_or_default(),
            source: item
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            published_at: item.published.unwrap_or_default(),
            summary: item.description.unwrap_or_default(),
            score: None,
        })
        .collect())
}

#[instrument(level = "debug", skip_all, fields(source = %descriptor.label))]
pub async fn fetch(fetcher: &Fetcher, descriptor: &SourceDescriptor) -> Result<Vec<Article>, FetchError> {
    let mut candidates = Vec::new();

    for keywords in descriptor.queries.iter().filter(|q| !q.trim().is_empty()) {
        let mut url = Url::parse_with_params(
            descriptor.endpoint(),
            &[("keywords", keywords.as_str()), ("language", "en")],
        )?;
        if let Some(key) = fetcher.currents_api_key() {
            url.query_pairs_mut().append_pair("apiKey", key);
        }

        let body = fetcher.get_text(url, descriptor.timeout(), false).await?;
        let items = parse_news(&body)?;
        debug!(%keywords, count = items.len(), "Currents results");
        candidates.extend(items);
    }

    Ok(normalize(
        candidates,
        descriptor.max_items(),
        fetcher.summary_budget(),
    ))
}
