//! Error types for source fetching and catalogue loading.
//!
//! Fetch errors never escape the aggregator: they are captured per source in
//! [`SourceOutcome::Failed`](crate::models::SourceOutcome::Failed) so the run
//! keeps going. Catalogue errors are fatal and bubble up to `main`.

use thiserror::Error;

/// Why a single source contributed no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML payload: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("feed ended inside an <item>")]
    Truncated,

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Problems with the source catalogue document.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("could not read catalogue {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalogue is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("source {label:?} is misconfigured: {reason}")]
    Invalid { label: String, reason: String },
}
