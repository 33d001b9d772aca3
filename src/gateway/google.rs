//! Google Custom Search JSON API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{decode_json, ensure_success};
use super::source::SearchSource;
use crate::error::SearchError;

/// Results requested per query.
const RESULT_COUNT: &str = "5";

/// Web search through a programmable search engine.
pub struct GoogleSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    display_link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearch {
    /// Creates a Google source. Missing credentials surface per query.
    #[must_use]
    pub const fn new(
        client: Client,
        endpoint: String,
        api_key: Option<String>,
        engine_id: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            engine_id,
        }
    }
}

#[async_trait]
impl SearchSource for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let key = self.api_key.as_deref().ok_or(SearchError::MissingCredential {
            name: "GOOGLE_API_KEY",
        })?;
        let cx = self
            .engine_id
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                name: "SEARCH_ENGINE_ID",
            })?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", key), ("cx", cx), ("q", query), ("num", RESULT_COUNT)])
            .send()
            .await?;
        let data: SearchResponse = decode_json(ensure_success(response).await?).await?;

        Ok(data
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "[Google Result {}] {} - {}\n{}",
                    i + 1,
                    item.title,
                    item.display_link,
                    item.snippet
                )
            })
            .collect())
    }
}

impl std::fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("endpoint", &self.endpoint)
            .field("configured", &(self.api_key.is_some() && self.engine_id.is_some()))
            .finish()
    }
}
