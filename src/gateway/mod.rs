//! Tool gateway: uniform access to the external search sources.
//!
//! The step executor calls [`ToolGateway::query_source`] with the source the
//! model picked. The gateway never fails: transient errors are retried per
//! the [`RetryPolicy`], and whatever still goes wrong is folded into a
//! single `"{Provider} Error: ..."` result entry the model can read.
//!
//! # Architecture
//!
//! ```text
//! StepExecutor ── tool call ──→ ToolGateway::query_source(Source, query)
//!                                 ├── RetryPolicy::run
//!                                 │   └── dyn SearchSource::search
//!                                 │       (Google | ArXiv | NewsAPI | SEC | Wikipedia)
//!                                 └── Vec<String> result entries
//! ```

pub mod arxiv;
pub mod config;
pub mod google;
pub mod http;
pub mod newsapi;
pub mod retry;
pub mod sec;
pub mod source;
pub mod wikipedia;

use std::collections::HashMap;
use std::sync::Arc;

pub use config::{Endpoints, GatewayConfig};
pub use retry::RetryPolicy;
pub use source::{SearchSource, Source};

use crate::error::SearchError;

/// Dispatches queries to registered search sources with retry and error folding.
pub struct ToolGateway {
    sources: HashMap<Source, Arc<dyn SearchSource>>,
    retry: RetryPolicy,
}

impl ToolGateway {
    /// Creates a gateway with every built-in source registered.
    ///
    /// Sources whose credentials are missing stay registered and report the
    /// missing credential as their result.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Transport`] if the HTTP client cannot be built,
    /// or [`SearchError::Malformed`] if the `ArXiv` feed patterns fail to compile.
    pub fn new(config: &GatewayConfig) -> Result<Self, SearchError> {
        let client = http::build_client(config)?;
        let endpoints = &config.endpoints;

        Ok(Self::empty()
            .with_retry(config.retry)
            .with_source(
                Source::Google,
                Arc::new(google::GoogleSearch::new(
                    client.clone(),
                    endpoints.google.clone(),
                    config.google_api_key.clone(),
                    config.search_engine_id.clone(),
                )),
            )
            .with_source(
                Source::Arxiv,
                Arc::new(arxiv::ArxivSearch::new(
                    client.clone(),
                    endpoints.arxiv.clone(),
                )?),
            )
            .with_source(
                Source::NewsApi,
                Arc::new(newsapi::NewsApiSearch::new(
                    client.clone(),
                    endpoints.newsapi.clone(),
                    config.newsapi_key.clone(),
                )),
            )
            .with_source(
                Source::Sec,
                Arc::new(sec::SecSearch::new(client.clone(), endpoints.sec.clone())),
            )
            .with_source(
                Source::Wikipedia,
                Arc::new(wikipedia::WikipediaSearch::new(
                    client,
                    endpoints.wikipedia.clone(),
                )),
            ))
    }

    /// Creates a gateway with no sources and the default retry policy.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Registers (or replaces) the backend for `source`.
    #[must_use]
    pub fn with_source(mut self, source: Source, backend: Arc<dyn SearchSource>) -> Self {
        self.sources.insert(source, backend);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the registered sources in menu order.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| self.sources.contains_key(s))
            .collect()
    }

    /// Queries one source and returns its result entries.
    ///
    /// Never fails. An unregistered source, an empty result set, or an error
    /// that survives the retry policy each yield a single explanatory entry.
    pub async fn query_source(&self, source: Source, query: &str) -> Vec<String> {
        let Some(backend) = self.sources.get(&source) else {
            return vec![unsupported(source.name())];
        };

        let query = query.trim();
        if query.is_empty() {
            return vec![format!("{}: query cannot be empty", source.error_label())];
        }

        tracing::debug!(source = source.name(), query, "querying search source");
        match self
            .retry
            .run(source.name(), || backend.search(query))
            .await
        {
            Ok(entries) if entries.is_empty() => {
                vec![format!(
                    "{}: no results found for '{query}'.",
                    source.display_name()
                )]
            }
            Ok(entries) => {
                tracing::debug!(source = source.name(), count = entries.len(), "search results");
                entries
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "search source failed");
                vec![format!("{}: {e}", source.error_label())]
            }
        }
    }

    /// Queries a source by short name and joins the entries with blank lines.
    ///
    /// Unknown names produce `"[Gateway] Source '{name}' not supported."`.
    pub async fn query_source_by_name(&self, name: &str, query: &str) -> String {
        match Source::parse(name) {
            Some(source) => self.query_source(source, query).await.join("\n\n"),
            None => unsupported(name),
        }
    }
}

fn unsupported(name: &str) -> String {
    format!("[Gateway] Source '{name}' not supported.")
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("sources", &self.sources())
            .field("retry", &self.retry)
            .finish()
    }
}
