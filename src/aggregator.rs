//! Fetch every catalogue source and render the survivors as one text digest.
//!
//! Sources run through a bounded stream (`concurrency` at a time, 1 means
//! strictly sequential). `buffered` yields results in input order, so the
//! digest always follows catalogue order regardless of which source answered
//! first.
//!
//! # Rendered Format
//!
//! ```text
//! ## Global
//!
//! Title: Rates held steady
//! URL: https://www.bbc.co.uk/news/articles/1
//! Source: BBC Business
//! Date: Tue, 06 May 2025 07:00:00 GMT
//! Summary: The central bank kept rates unchanged.
//!
//! Title: ...
//!
//! ## Regional
//!
//! No articles available.
//! ```

use crate::catalogue::Catalogue;
use crate::models::{Article, CategoryDigest, SourceReport};
use crate::sources::Fetcher;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{info, instrument};

/// Body of a category section that yielded no articles at all.
pub const NO_ARTICLES_PLACEHOLDER: &str = "No articles available.";

/// Poll every source in the catalogue once and group the reports by category.
#[instrument(level = "info", skip_all, fields(concurrency = concurrency))]
pub async fn fetch_all(
    fetcher: &Fetcher,
    catalogue: &Catalogue,
    concurrency: usize,
) -> Vec<CategoryDigest> {
    let jobs = catalogue
        .categories
        .iter()
        .enumerate()
        .flat_map(|(i, category)| category.sources.iter().map(move |source| (i, source)));

    let reports: Vec<(usize, SourceReport)> = stream::iter(jobs)
        .map(|(i, source)| async move {
            let outcome = fetcher.fetch(source).await;
            (
                i,
                SourceReport {
                    label: source.label.clone(),
                    kind: source.kind,
                    outcome,
                },
            )
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut digests: Vec<CategoryDigest> = catalogue
        .categories
        .iter()
        .map(|c| CategoryDigest {
            label: c.label.clone(),
            reports: Vec::new(),
        })
        .collect();
    for (i, report) in reports {
        digests[i].reports.push(report);
    }

    for digest in &digests {
        info!(
            category = %digest.label,
            articles = digest.article_count(),
            failed_sources = digest.failed_sources().count(),
            "Category fetched"
        );
    }
    digests
}

/// Render one article as a fixed-format text record.
pub fn render_article(article: &Article) -> String {
    let mut lines = vec![
        format!("Title: {}", article.title),
        format!("URL: {}", article.url),
        format!("Source: {}", article.source),
    ];
    if !article.published_at.is_empty() {
        lines.push(format!("Date: {}", article.published_at));
    }
    if let Some(score) = article.score {
        lines.push(format!("Points: {score}"));
    }
    if let Some(summary) = &article.summary {
        lines.push(format!("Summary: {summary}"));
    }
    lines.join("\n")
}

/// Render a category heading followed by its articles, blank-line separated.
pub fn render_category(digest: &CategoryDigest) -> String {
    let body = if digest.article_count() == 0 {
        NO_ARTICLES_PLACEHOLDER.to_string()
    } else {
        digest.articles().map(render_article).join("\n\n")
    };
    format!("## {}\n\n{}", digest.label, body)
}

/// Render all categories in order.
pub fn render_digest(digests: &[CategoryDigest]) -> String {
    digests.iter().map(render_category).join("\n\n")
}
