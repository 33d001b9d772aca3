//! NewsAPI `/v2/everything` search.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{decode_json, ensure_success};
use super::source::SearchSource;
use crate::error::SearchError;

/// Articles requested per query.
const PAGE_SIZE: &str = "5";

/// English news search sorted by relevancy.
pub struct NewsApiSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

impl NewsApiSearch {
    /// Creates a NewsAPI source.
    #[must_use]
    pub const fn new(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SearchSource for NewsApiSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                name: "NEWSAPI_KEY",
            })?;

        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", key)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("pageSize", PAGE_SIZE),
            ])
            .send()
            .await?;
        let data: EverythingResponse = decode_json(ensure_success(response).await?).await?;

        Ok(data
            .articles
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let source = article
                    .source
                    .as_ref()
                    .and_then(|s| s.name.as_deref())
                    .unwrap_or("unknown source");
                format!(
                    "[News {}] {} ({source})\n{}\nURL: {}",
                    i + 1,
                    article.title.as_deref().unwrap_or("Untitled"),
                    article.description.as_deref().unwrap_or_default(),
                    article.url.as_deref().unwrap_or_default(),
                )
            })
            .collect())
    }
}

impl std::fmt::Debug for NewsApiSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiSearch")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}
