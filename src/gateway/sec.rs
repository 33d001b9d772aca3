//! SEC EDGAR company lookup.
//!
//! EDGAR's browse endpoint returns HTML; only the presence of a matching
//! company is reported, with a pointer to the SEC site for the filings.

use async_trait::async_trait;
use reqwest::Client;

use super::source::SearchSource;
use crate::error::SearchError;

/// Marker EDGAR prints when the company search is empty.
const NO_MATCH_MARKER: &str = "No matching companies";

/// Company filings lookup on SEC EDGAR.
#[derive(Debug)]
pub struct SecSearch {
    client: Client,
    endpoint: String,
}

impl SecSearch {
    /// Creates an EDGAR source.
    #[must_use]
    pub const fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl SearchSource for SecSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("company", query), ("action", "getcompany")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
                message: "Unable to retrieve data from SEC.".to_string(),
            });
        }

        let body = response.text().await?;
        let line = if body.contains(NO_MATCH_MARKER) {
            format!("SEC API: No filings found for '{query}'.")
        } else {
            format!("SEC API: Filings and data retrieved for {query}. Check SEC's website for details.")
        };
        Ok(vec![line])
    }
}
