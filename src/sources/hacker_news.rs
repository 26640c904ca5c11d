//! Hacker News stories via the Algolia search API.
//!
//! Each configured query becomes one request:
//!
//! ```text
//! GET {endpoint}?query=fintech&tags=story&hitsPerPage=5
//! ```
//!
//! Hits from all queries are concatenated in query order before filtering and
//! capping. A failing query fails the whole source. Link posts carry a `url`;
//! text posts do not, so those fall back to the item's discussion page.

use super::{Candidate, Fetcher, normalize};
use crate::catalogue::SourceDescriptor;
use crate::error::FetchError;
use crate::models::Article;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    #[serde(rename = "objectID")]
    object_id: Option<String>,
    created_at: Option<String>,
}

impl Hit {
    fn into_candidate(self, label: &str) -> Candidate {
        let url = match self.url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url,
            None => self
                .object_id
                .map(|id| format!("{ITEM_URL}{id}"))
                .unwrap_or_default(),
        };
        Candidate {
            title: self.title.unwrap_or_default(),
            url,
            source: label.to_string(),
            published_at: self.created_at.unwrap_or_default(),
            summary: String::new(),
            score: self.points,
        }
    }
}

/// Decode one search response into candidates.
pub fn parse_hits(body: &str, label: &str) -> Result<Vec<Candidate>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .hits
        .into_iter()
        .map(|hit| hit.into_candidate(label))
        .collect())
}

#[instrument(level = "debug", skip_all, fields(source = %descriptor.label))]
pub async fn fetch(fetcher: &Fetcher, descriptor: &SourceDescriptor) -> Result<Vec<Article>, FetchError> {
    let hits_per_page = descriptor.hits_per_query().to_string();
    let mut candidates = Vec::new();

    for query in descriptor.queries.iter().filter(|q| !q.trim().is_empty()) {
        let url = Url::parse_with_params(
            descriptor.endpoint(),
            &[
                ("query", query.as_str()),
                ("tags", "story"),
                ("hitsPerPage", hits_per_page.as_str()),
            ],
        )?;
        let body = fetcher.get_text(url, descriptor.timeout(), false).await?;
        let hits = parse_hits(&body, &descriptor.label)?;
        debug!(%query, count = hits.len(), "Hacker News hits");
        candidates.extend(hits);
    }

    Ok(normalize(
        candidates,
        descriptor.max_items(),
        fetcher.summary_budget(),
    ))
}
