//! RSS feed reader.
//!
//! Handles RSS 2.0 (`<rss><channel><item>`) and RSS 1.0/RDF
//! (`<rdf:RDF><item>`) layouts. For each `<item>` we keep the direct children
//! `title`, `link`, `description` (HTML stripped, `content:encoded` as a
//! fallback), `pubDate` (or `dc:date`), and the text of `<source>`, which
//! aggregator feeds such as Google News use to name the original outlet.
//! Without a `<source>` the descriptor label is used.
//!
//! Elements are matched by their qualified name, so extension elements such
//! as `media:title` or `atom:link` never shadow the plain ones. Everything
//! else inside an item is skipped.
//!
//! Parsing is all-or-nothing: a document that is not well-formed contributes
//! no items, even if some items before the error were fine.

use super::{Candidate, Fetcher, normalize};
use crate::catalogue::SourceDescriptor;
use crate::error::FetchError;
use crate::models::Article;
use crate::utils::collapse_whitespace;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Link,
    Description,
    Content,
    PubDate,
    DcDate,
    Source,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"content:encoded" => Some(Field::Content),
            b"pubDate" => Some(Field::PubDate),
            b"dc:date" => Some(Field::DcDate),
            b"source" => Some(Field::Source),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ItemFields {
    title: String,
    link: String,
    description: String,
    content: String,
    pub_date: String,
    dc_date: String,
    source: String,
}

impl ItemFields {
    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
            Field::PubDate => &mut self.pub_date,
            Field::DcDate => &mut self.dc_date,
            Field::Source => &mut self.source,
        }
    }

    fn into_candidate(self, label: &str) -> Candidate {
        let source = if self.source.trim().is_empty() {
            label.to_string()
        } else {
            self.source
        };
        let published_at = if self.pub_date.trim().is_empty() {
            self.dc_date
        } else {
            self.pub_date
        };
        let description = if self.description.trim().is_empty() {
            self.content
        } else {
            self.description
        };

        Candidate {
            title: self.title,
            url: self.link,
            source,
            published_at,
            summary: strip_html(&description),
            score: None,
        }
    }
}

/// Resolve entity references in raw text, keeping the text as-is when an
/// entity is unknown.
fn unescape_lossy(raw: &str) -> String {
    unescape(raw)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Decode an RSS document into candidates, in document order.
pub fn parse_feed(xml: &str, label: &str) -> Result<Vec<Candidate>, FetchError> {
    let xml = xml.trim_start_matches('\u{feff}').trim_start();
    let mut reader = Reader::from_str(xml);

    let mut candidates = Vec::new();
    let mut item: Option<ItemFields> = None;
    // Element depth below the current <item>; 1 = direct child.
    let mut depth = 0usize;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some(fields) = item.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        field = Field::from_name(e.name().as_ref());
                    } else if let Some(f) = field {
                        // inline markup inside a field, e.g. XHTML descriptions
                        fields.buffer(f).push(' ');
                    }
                } else if e.name().as_ref() == b"item" {
                    item = Some(ItemFields::default());
                    depth = 0;
                    field = None;
                }
            }
            Event::Empty(_) => {
                if let (Some(fields), Some(f)) = (item.as_mut(), field) {
                    fields.buffer(f).push(' ');
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    if let Some(fields) = item.take() {
                        candidates.push(fields.into_candidate(label));
                    }
                } else {
                    if depth == 1 {
                        field = None;
                    } else if let (Some(fields), Some(f)) = (item.as_mut(), field) {
                        fields.buffer(f).push(' ');
                    }
                    depth -= 1;
                }
            }
            Event::Text(e) => {
                if let (Some(fields), Some(f)) = (item.as_mut(), field) {
                    let raw = String::from_utf8_lossy(&e);
                    fields.buffer(f).push_str(&unescape_lossy(&raw));
                }
            }
            Event::CData(e) => {
                if let (Some(fields), Some(f)) = (item.as_mut(), field) {
                    fields.buffer(f).push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let (Some(fields), Some(f)) = (item.as_mut(), field) {
                    let reference = format!("&{};", String::from_utf8_lossy(&e));
                    fields.buffer(f).push_str(&unescape_lossy(&reference));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if item.is_some() {
        return Err(FetchError::Truncated);
    }
    Ok(candidates)
}

/// Strip HTML tags from a string and normalize whitespace.
///
/// `<` only opens a tag when followed by a letter, `/`, `!` or `?`, so prose
/// like "profits < forecast" survives.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' if !in_tag
                && chars
                    .peek()
                    .is_some_and(|c| c.is_alphabetic() || matches!(c, '/' | '!' | '?')) =>
            {
                in_tag = true
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    collapse_whitespace(&out)
}

#[instrument(level = "debug", skip_all, fields(source = %descriptor.label))]
pub async fn fetch(fetcher: &Fetcher, descriptor: &SourceDescriptor) -> Result<Vec<Article>, FetchError> {
    let url = Url::parse(descriptor.endpoint())?;
    let body = fetcher.get_text(url, descriptor.timeout(), true).await?;
    debug!(bytes = body.len(), "Downloaded feed");

    let candidates = parse_feed(&body, &descriptor.label)?;
    debug!(items = candidates.len(), "Parsed feed items");

    Ok(normalize(
        candidates,
        descriptor.max_items(),
        fetcher.summary_budget(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::SourceKind;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
    <title>BBC News - Business</title>
    <link>https://www.bbc.co.uk/news/business</link>
    <item>
        <title>Rates held steady</title>
        <link>https://www.bbc.co.uk/news/articles/1</link>
        <description>The central bank kept rates &amp; guidance unchanged.</description>
        <pubDate>Tue, 06 May 2025 07:00:00 GMT</pubDate>
        <guid isPermaLink="false">1</guid>
    </item>
    <item>
        <title>Missing link</title>
        <description>Dropped.</description>
    </item>
    <item>
        <title><![CDATA[Payments firm <b>expands</b>]]></title>
        <link>https://www.bbc.co.uk/news/articles/3</link>
        <description><![CDATA[<p>Now in <a href="https://example.com">ten</a> markets.</p>]]></description>
    </item>
    <atom:link href="https://feeds.bbci.co.uk/news/business/rss.xml" rel="self"/>
</channel>
</rss>"#;

    fn descriptor(endpoint: String, max_items: usize) -> SourceDescriptor {
        SourceDescriptor {
            label: "BBC Business".to_string(),
            kind: SourceKind::Rss,
            endpoint: Some(endpoint),
            queries: vec![],
            max_items: Some(max_items),
            timeout_secs: Some(5),
            hits_per_query: None,
        }
    }

    #[test]
    fn test_parse_rss2_items() {
        let candidates = parse_feed(RSS, "BBC Business").unwrap();

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].title, "Rates held steady");
        assert_eq!(
            candidates[0].summary,
            "The central bank kept rates & guidance unchanged."
        );
        assert_eq!(candidates[0].published_at, "Tue, 06 May 2025 07:00:00 GMT");
        assert_eq!(candidates[0].source, "BBC Business");
        assert_eq!(candidates[1].url, "");
        assert_eq!(candidates[2].summary, "Now in ten markets.");
    }

    #[test]
    fn test_parse_source_element_overrides_label() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
                <title>Fintech hub grows - The Globe and Mail</title>
                <link>https://news.google.com/articles/abc</link>
                <pubDate>Tue, 06 May 2025 09:00:00 GMT</pubDate>
                <source url="https://www.theglobeandmail.com">The Globe and Mail</source>
            </item>
        </channel></rss>"#;
        let candidates = parse_feed(xml, "Google News").unwrap();
        assert_eq!(candidates[0].source, "The Globe and Mail");
    }

    #[test]
    fn test_parse_rdf_layout() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
    <channel rdf:about="https://example.com/">
        <title>Example</title>
    </channel>
    <item rdf:about="https://example.com/1">
        <title>RDF story</title>
        <link>https://example.com/1</link>
        <dc:date>2025-05-06T08:00:00Z</dc:date>
    </item>
</rdf:RDF>"#;
        let candidates = parse_feed(xml, "Example").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "RDF story");
        assert_eq!(candidates[0].published_at, "2025-05-06T08:00:00Z");
    }

    #[test]
    fn test_parse_namespaced_extensions() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:atom="http://www.w3.org/2005/Atom"
    xmlns:media="http://search.yahoo.com/mrss/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
    <title>Financial Post</title>
    <atom:link href="https://financialpost.com/feed" rel="self" type="application/rss+xml"/>
    <item>
        <title>Bank of Canada holds</title>
        <media:title type="plain">Governor at the podium</media:title>
        <link>https://financialpost.com/news/boc-holds</link>
        <atom:link href="https://financialpost.com/news/boc-holds/amp" rel="amphtml"/>
        <dc:creator><![CDATA[Staff]]></dc:creator>
        <dc:title>Alternate title</dc:title>
        <pubDate>Wed, 07 May 2025 14:00:00 +0000</pubDate>
        <media:group>
            <media:content url="https://financialpost.com/img.jpg">
                <media:title>Nested caption</media:title>
            </media:content>
        </media:group>
        <description><p>Rates stay at <b>2.75%</b>.</p><p>Markets shrug.</p></description>
    </item>
    <item>
        <title>Payments modernization update</title>
        <link>https://financialpost.com/news/payments</link>
        <dc:date>2025-05-07T09:30:00Z</dc:date>
        <description></description>
        <content:encoded><![CDATA[<p>Real-time rail launches in <em>2026</em>.</p>]]></content:encoded>
    </item>
</channel>
</rss>"#;
        let candidates = parse_feed(xml, "Financial Post").unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Bank of Canada holds");
        assert_eq!(candidates[0].url, "https://financialpost.com/news/boc-holds");
        assert_eq!(candidates[0].published_at, "Wed, 07 May 2025 14:00:00 +0000");
        assert_eq!(candidates[0].summary, "Rates stay at 2.75% . Markets shrug.");
        assert_eq!(candidates[0].source, "Financial Post");
        assert_eq!(candidates[1].published_at, "2025-05-07T09:30:00Z");
        assert_eq!(candidates[1].summary, "Real-time rail launches in 2026.");
    }

    #[test]
    fn test_parse_google_news_shape() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss xmlns:media="http://search.yahoo.com/mrss/" version="2.0"><channel>
<generator>NFE/5.0</generator><title>"fintech Toronto" - Google News</title>
<item><title>Toronto startup raises $20M - BetaKit</title><link>https://news.google.com/rss/articles/CBMi1</link><guid isPermaLink="false">CBMi1</guid><pubDate>Tue, 06 May 2025 12:00:00 GMT</pubDate><description>&lt;a href="https://news.google.com/rss/articles/CBMi1" target="_blank"&gt;Toronto startup raises $20M&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;BetaKit&lt;/font&gt;</description><source url="https://betakit.com">BetaKit</source></item>
<item><title>Second &amp; final</title><link>https://news.google.com/rss/articles/CBMi2</link><source url="https://www.theglobeandmail.com">The Globe and Mail</source></item>
</channel></rss>"#;
        let candidates = parse_feed(xml, "Google News Toronto").unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source, "BetaKit");
        assert_eq!(candidates[0].summary, "Toronto startup raises $20M&nbsp;&nbsp;BetaKit");
        assert_eq!(candidates[1].title, "Second & final");
        assert_eq!(candidates[1].source, "The Globe and Mail");
    }

    #[test]
    fn test_parse_truncated_feed_fails() {
        let xml = r#"<rss><channel><item><title>Cut off</title>"#;
        assert!(parse_feed(xml, "Cut").is_err());
    }

    #[test]
    fn test_parse_malformed_xml_fails() {
        let xml = r#"<rss><channel><item><title>Broken</channel></rss>"#;
        assert!(matches!(parse_feed(xml, "Broken"), Err(FetchError::Xml(_))));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello   <b>world</b></p>\n"), "Hello world");
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(
            strip_html("profits < forecast, up > 5% <br/>again"),
            "profits < forecast, up > 5% again"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/business/rss.xml"))
            .and(header_regex("user-agent", "^Mozilla/5.0"))
            .and(header_regex("accept", "application/rss\\+xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(200, None).unwrap();
        let d = descriptor(format!("{}/news/business/rss.xml", server.uri()), 8);
        let articles = fetch(&fetcher, &d).await.unwrap();

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Rates held steady", "Payments firm <b>expands</b>"]);
    }

    #[tokio::test]
    async fn test_fetch_caps_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(200, None).unwrap();
        let articles = fetch(&fetcher, &descriptor(server.uri(), 1)).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Rates held steady");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(200, None).unwrap();
        let err = fetch(&fetcher, &descriptor(server.uri(), 8)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
    }
}
