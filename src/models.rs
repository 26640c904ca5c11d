//! Data models for fetched articles, per-source outcomes and the daily brief.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: One normalized news item, built fresh on every run
//! - [`SourceOutcome`] / [`SourceReport`]: What a single source produced
//! - [`CategoryDigest`]: All source reports of one catalogue category
//! - [`DailyBrief`]: The record persisted to disk after generation

use crate::catalogue::SourceKind;
use crate::error::FetchError;
use chrono::{DateTime, Local};
use serde::Serialize;

/// A news item normalized from a search hit or an RSS `<item>`.
///
/// Only built through [`crate::sources::normalize`], which guarantees that
/// `title` and `url` are non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Outlet or feed name.
    pub source: String,
    /// Publication date exactly as the provider formats it; may be empty.
    pub published_at: String,
    /// Short description, already truncated to the summary budget.
    pub summary: Option<String>,
    /// Provider ranking signal (Hacker News points).
    pub score: Option<i64>,
}

/// The result of polling one source: articles, or the reason there are none.
#[derive(Debug)]
pub enum SourceOutcome {
    Fetched(Vec<Article>),
    Failed(FetchError),
}

impl SourceOutcome {
    /// Articles contributed by this source; empty on failure.
    pub fn articles(&self) -> &[Article] {
        match self {
            SourceOutcome::Fetched(articles) => articles,
            SourceOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            SourceOutcome::Fetched(_) => None,
            SourceOutcome::Failed(e) => Some(e),
        }
    }
}

impl From<Result<Vec<Article>, FetchError>> for SourceOutcome {
    fn from(res: Result<Vec<Article>, FetchError>) -> Self {
        match res {
            Ok(articles) => SourceOutcome::Fetched(articles),
            Err(e) => SourceOutcome::Failed(e),
        }
    }
}

#[derive(Debug)]
pub struct SourceReport {
    pub label: String,
    pub kind: SourceKind,
    pub outcome: SourceOutcome,
}

/// Every source report of one category, in catalogue order.
#[derive(Debug)]
pub struct CategoryDigest {
    pub label: String,
    pub reports: Vec<SourceReport>,
}

impl CategoryDigest {
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.reports.iter().flat_map(|r| r.outcome.articles())
    }

    pub fn article_count(&self) -> usize {
        self.reports.iter().map(|r| r.outcome.articles().len()).sum()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed())
    }
}

/// The persisted output of a run.
///
/// Serialized as a flat JSON object and overwritten by the next run:
///
/// ```json
/// {
///   "date": "2025-05-06",
///   "generated_at": "2025-05-06T07:00:12.345678-04:00",
///   "content": "..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBrief {
    /// Calendar date of the run in `YYYY-MM-DD` format.
    pub date: String,
    /// RFC 3339 timestamp of when the model answered.
    pub generated_at: String,
    /// The model's text.
    pub content: String,
}

impl DailyBrief {
    pub fn new(content: String, now: DateTime<Local>) -> Self {
        Self {
            date: now.date_naive().to_string(),
            generated_at: now.to_rfc3339(),
            content,
        }
    }
}
