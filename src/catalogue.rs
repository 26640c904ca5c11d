//! The source catalogue: which feeds to poll and how they are grouped.
//!
//! A catalogue is an ordered list of categories, each holding an ordered list
//! of [`SourceDescriptor`]s. Order matters: the rendered digest follows it
//! exactly. A default catalogue is compiled into the binary from
//! `sources.yaml`; `--sources` swaps in a different file.
//!
//! ```yaml
//! categories:
//!   - label: Global
//!     sources:
//!       - label: Hacker News
//!         kind: hacker_news
//!         queries: [fintech, payments]
//!         max_items: 15
//!       - label: BBC Business
//!         kind: rss
//!         url: https://feeds.bbci.co.uk/news/business/rss.xml
//! ```

use crate::error::CatalogueError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

const DEFAULT_CATALOGUE: &str = include_str!("../sources.yaml");

pub const HACKER_NEWS_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";
pub const CURRENTS_ENDPOINT: &str = "https://api.currentsapi.services/v1/search";

/// The kind of upstream a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Hacker News stories through the Algolia search API.
    HackerNews,
    /// The Currents news search API.
    Currents,
    /// A plain RSS 2.0 / RDF feed.
    Rss,
}

impl SourceKind {
    fn default_max_items(self) -> usize {
        match self {
            SourceKind::HackerNews => 15,
            SourceKind::Currents | SourceKind::Rss => 8,
        }
    }

    fn default_timeout_secs(self) -> u64 {
        match self {
            SourceKind::HackerNews | SourceKind::Currents => 10,
            SourceKind::Rss => 15,
        }
    }

    fn default_endpoint(self) -> Option<&'static str> {
        match self {
            SourceKind::HackerNews => Some(HACKER_NEWS_ENDPOINT),
            SourceKind::Currents => Some(CURRENTS_ENDPOINT),
            SourceKind::Rss => None,
        }
    }

    pub fn is_search(self) -> bool {
        !matches!(self, SourceKind::Rss)
    }
}

/// One external feed to poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceDescriptor {
    /// Human-readable name, also used as the article source when the payload has none.
    pub label: String,
    pub kind: SourceKind,
    /// Feed URL for RSS, or an override of the search API base URL.
    #[serde(default, alias = "url")]
    pub endpoint: Option<String>,
    /// Search terms, one request each (search kinds only).
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Page size per query (search kinds only).
    #[serde(default)]
    pub hits_per_query: Option<usize>,
}

impl SourceDescriptor {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .or(self.kind.default_endpoint())
            .unwrap_or_default()
    }

    pub fn max_items(&self) -> usize {
        self.max_items.unwrap_or(self.kind.default_max_items())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(self.kind.default_timeout_secs()))
    }

    pub fn hits_per_query(&self) -> usize {
        self.hits_per_query.unwrap_or(5)
    }

    fn validate(&self) -> Result<(), CatalogueError> {
        let invalid = |reason: &str| CatalogueError::Invalid {
            label: self.label.clone(),
            reason: reason.to_string(),
        };

        if self.label.trim().is_empty() {
            return Err(invalid("label must not be empty"));
        }
        if self.endpoint().trim().is_empty() {
            return Err(invalid("url/endpoint must not be empty"));
        }
        if self.kind.is_search() && self.queries.iter().all(|q| q.trim().is_empty()) {
            return Err(invalid("a search source needs at least one query"));
        }
        Ok(())
    }
}

/// A named group of sources rendered together under one heading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub label: String,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Catalogue {
    pub categories: Vec<Category>,
}

impl Catalogue {
    /// Parse and validate a catalogue document.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = serde_yaml::from_str(yaml)?;
        for source in catalogue.categories.iter().flat_map(|c| &c.sources) {
            source.validate()?;
        }
        Ok(catalogue)
    }

    /// The catalogue compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogueError> {
        Self::from_yaml(DEFAULT_CATALOGUE)
    }

    pub fn source_count(&self) -> usize {
        self.categories.iter().map(|c| c.sources.len()).sum()
    }
}

/// Load the catalogue from `path`, or the built-in one when no path is given.
#[instrument(level = "info")]
pub async fn load(path: Option<&Path>) -> Result<Catalogue, CatalogueError> {
    let catalogue = match path {
        Some(path) => {
            let yaml = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CatalogueError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            Catalogue::from_yaml(&yaml)?
        }
        None => Catalogue::builtin()?,
    };

    info!(
        categories = catalogue.categories.len(),
        sources = catalogue.source_count(),
        "Loaded source catalogue"
    );
    Ok(catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_parses() {
        let catalogue = Catalogue::builtin().unwrap();
        assert!(!catalogue.categories.is_empty());
        assert!(catalogue.source_count() > 0);
    }

    #[test]
    fn test_defaults_per_kind() {
        let yaml = r#"
categories:
  - label: Global
    sources:
      - label: Hacker News
        kind: hacker_news
        queries: [fintech]
      - label: BBC Business
        kind: rss
        url: https://feeds.bbci.co.uk/news/business/rss.xml
"#;
        let catalogue = Catalogue::from_yaml(yaml).unwrap();
        let sources = &catalogue.categories[0].sources;

        assert_eq!(sources[0].endpoint(), HACKER_NEWS_ENDPOINT);
        assert_eq!(sources[0].max_items(), 15);
        assert_eq!(sources[0].timeout(), Duration::from_secs(10));
        assert_eq!(sources[0].hits_per_query(), 5);

        assert_eq!(
            sources[1].endpoint(),
            "https://feeds.bbci.co.uk/news/business/rss.xml"
        );
        assert_eq!(sources[1].max_items(), 8);
        assert_eq!(sources[1].timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let yaml = r#"
categories:
  - label: Regional
    sources:
      - label: Currents
        kind: currents
        endpoint: http://localhost:9999/search
        queries: [banking]
        max_items: 3
        timeout_secs: 2
"#;
        let catalogue = Catalogue::from_yaml(yaml).unwrap();
        let source = &catalogue.categories[0].sources[0];
        assert_eq!(source.kind, SourceKind::Currents);
        assert_eq!(source.endpoint(), "http://localhost:9999/search");
        assert_eq!(source.max_items(), 3);
        assert_eq!(source.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_rss_without_url_is_rejected() {
        let yaml = r#"
categories:
  - label: National
    sources:
      - label: Nowhere
        kind: rss
"#;
        let err = Catalogue::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CatalogueError::Invalid { ref label, .. } if label == "Nowhere"));
    }

    #[test]
    fn test_search_without_queries_is_rejected() {
        let yaml = r#"
categories:
  - label: Global
    sources:
      - label: Hacker News
        kind: hacker_news
"#;
        assert!(Catalogue::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let yaml = r#"
categories:
  - label: Global
    sources:
      - label: Mystery
        kind: carrier_pigeon
        url: https://example.com
"#;
        assert!(matches!(
            Catalogue::from_yaml(yaml),
            Err(CatalogueError::Yaml(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load(Some(Path::new("/definitely/not/here/sources.yaml")))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Io { .. }));
    }
}
