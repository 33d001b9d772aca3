//! ArXiv Atom export API.
//!
//! The feed is small and flat, so entries are pulled out with regular
//! expressions rather than a full XML parser.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use unicode_segmentation::UnicodeSegmentation;

use super::http::ensure_success;
use super::source::SearchSource;
use crate::error::SearchError;

/// Papers requested per query.
const MAX_RESULTS: &str = "3";
/// Summary length (in graphemes) kept per paper.
const SUMMARY_LEN: usize = 300;

/// Paper search through the ArXiv export API.
#[derive(Debug)]
pub struct ArxivSearch {
    client: Client,
    endpoint: String,
    patterns: FeedPatterns,
}

/// Compiled Atom element patterns.
#[derive(Debug)]
struct FeedPatterns {
    entry: Regex,
    title: Regex,
    summary: Regex,
}

/// One parsed Atom entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    title: Option<String>,
    summary: Option<String>,
}

impl ArxivSearch {
    /// Creates an ArXiv source.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Malformed`] if a feed pattern fails to compile.
    pub fn new(client: Client, endpoint: String) -> Result<Self, SearchError> {
        Ok(Self {
            client,
            endpoint,
            patterns: FeedPatterns::new()?,
        })
    }
}

#[async_trait]
impl SearchSource for ArxivSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let search_query = format!("all:{query}");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", MAX_RESULTS),
            ])
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        Ok(self
            .patterns
            .parse(&body)?
            .iter()
            .enumerate()
            .map(|(i, entry)| format_entry(i + 1, entry))
            .collect())
    }
}

fn format_entry(position: usize, entry: &Entry) -> String {
    let title = entry.title.as_deref().unwrap_or("No title");
    let summary = entry.summary.as_deref().map_or_else(
        || "No summary".to_string(),
        |s| {
            let cut: String = s.graphemes(true).take(SUMMARY_LEN).collect();
            format!("{cut}...")
        },
    );
    format!("[ArXiv Result {position}] {title}\nSummary: {summary}")
}

impl FeedPatterns {
    fn new() -> Result<Self, SearchError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SearchError::Malformed {
                message: format!("feed pattern: {e}"),
            })
        };
        Ok(Self {
            entry: compile(r"(?s)<entry\b[^>]*>(.*?)</entry>")?,
            title: compile(r"(?s)<title\b[^>]*>(.*?)</title>")?,
            summary: compile(r"(?s)<summary\b[^>]*>(.*?)</summary>")?,
        })
    }

    /// Extracts entry titles and summaries from an Atom feed.
    fn parse(&self, xml: &str) -> Result<Vec<Entry>, SearchError> {
        if !xml.contains("<feed") {
            return Err(SearchError::Malformed {
                message: "response is not an Atom feed".to_string(),
            });
        }

        let field = |re: &Regex, body: &str| {
            re.captures(body)
                .and_then(|c| c.get(1))
                .map(|m| normalize(m.as_str()))
                .filter(|s| !s.is_empty())
        };

        Ok(self
            .entry
            .captures_iter(xml)
            .filter_map(|c| c.get(1))
            .map(|body| Entry {
                title: field(&self.title, body.as_str()),
                summary: field(&self.summary, body.as_str()),
            })
            .collect())
    }
}

/// Collapses whitespace runs and decodes the XML entities ArXiv emits.
fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
