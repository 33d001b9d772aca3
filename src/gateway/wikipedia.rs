//! Wikipedia intro extracts through the `MediaWiki` action API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{decode_json, ensure_success};
use super::source::SearchSource;
use crate::error::SearchError;

/// Plain-text intro extract lookup by page title.
#[derive(Debug)]
pub struct WikipediaSearch {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaSearch {
    /// Creates a Wikipedia source.
    #[must_use]
    pub const fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl SearchSource for WikipediaSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("titles", query),
                ("format", "json"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
            ])
            .send()
            .await?;
        let data: QueryResponse = decode_json(ensure_success(response).await?).await?;

        Ok(data
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_values()
            .filter_map(|page| page.extract)
            .filter(|extract| !extract.trim().is_empty())
            .map(|extract| format!("[Wikipedia]\n{extract}"))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> WikipediaSearch {
        WikipediaSearch::new(Client::new(), format!("{}/w/api.php", server.uri()))
    }

    #[tokio::test]
    async fn test_returns_extract() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Paris"))
            .and(query_param("prop", "extracts"))
            .and(query_param("explaintext", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": "",
                "query": {"pages": {"22989": {
                    "pageid": 22989,
                    "title": "Paris",
                    "extract": "Paris is the capital and largest city of France."
                }}}
            })))
            .mount(&server)
            .await;

        let results = source(&server).search("Paris").await.unwrap_or_default();
        assert_eq!(
            results,
            vec!["[Wikipedia]\nParis is the capital and largest city of France."]
        );
    }

    #[tokio::test]
    async fn test_missing_page_has_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": {"-1": {"ns": 0, "title": "Qwxyz", "missing": ""}}}
            })))
            .mount(&server)
            .await;

        let results = source(&server).search("Qwxyz").await;
        assert!(results.is_ok_and(|r| r.is_empty()));
    }

    #[tokio::test]
    async fn test_non_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = source(&server).search("Paris").await;
        assert!(matches!(err, Err(SearchError::Malformed { .. })));
    }
}
