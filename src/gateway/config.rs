//! Search gateway configuration.
//!
//! Credentials come from the environment (`GOOGLE_API_KEY`,
//! `SEARCH_ENGINE_ID`, `NEWSAPI_KEY`); endpoints default to the public
//! provider URLs and can be overridden to point at a proxy or a mock server.

use std::time::Duration;

use super::retry::RetryPolicy;

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default Google Custom Search endpoint.
pub const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
/// Default ArXiv Atom export endpoint.
pub const ARXIV_ENDPOINT: &str = "http://export.arxiv.org/api/query";
/// Default NewsAPI "everything" endpoint.
pub const NEWSAPI_ENDPOINT: &str = "https://newsapi.org/v2/everything";
/// Default SEC EDGAR company browse endpoint.
pub const SEC_ENDPOINT: &str = "https://www.sec.gov/cgi-bin/browse-edgar";
/// Default `MediaWiki` API endpoint for English Wikipedia.
pub const WIKIPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Base URLs for each search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Google Custom Search JSON API.
    pub google: String,
    /// ArXiv export API.
    pub arxiv: String,
    /// NewsAPI everything endpoint.
    pub newsapi: String,
    /// SEC EDGAR company browse.
    pub sec: String,
    /// `MediaWiki` action API.
    pub wikipedia: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google: GOOGLE_ENDPOINT.to_string(),
            arxiv: ARXIV_ENDPOINT.to_string(),
            newsapi: NEWSAPI_ENDPOINT.to_string(),
            sec: SEC_ENDPOINT.to_string(),
            wikipedia: WIKIPEDIA_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every provider at `base` (used with a single mock server).
    ///
    /// Paths are kept so requests remain distinguishable:
    /// `/customsearch/v1`, `/api/query`, `/v2/everything`,
    /// `/cgi-bin/browse-edgar`, `/w/api.php`.
    #[must_use]
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            google: format!("{base}/customsearch/v1"),
            arxiv: format!("{base}/api/query"),
            newsapi: format!("{base}/v2/everything"),
            sec: format!("{base}/cgi-bin/browse-edgar"),
            wikipedia: format!("{base}/w/api.php"),
        }
    }
}

/// Configuration for the [`ToolGateway`](super::ToolGateway).
#[derive(Clone)]
pub struct GatewayConfig {
    /// Google API key (`GOOGLE_API_KEY`).
    pub google_api_key: Option<String>,
    /// Google programmable search engine ID (`SEARCH_ENGINE_ID`).
    pub search_engine_id: Option<String>,
    /// NewsAPI key (`NEWSAPI_KEY`).
    pub newsapi_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request (EDGAR rejects anonymous clients).
    pub user_agent: String,
    /// Retry policy applied to each provider call.
    pub retry: RetryPolicy,
    /// Provider base URLs.
    pub endpoints: Endpoints,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            search_engine_id: None,
            newsapi_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("deepquest/", env!("CARGO_PKG_VERSION"), " (research assistant)")
                .to_string(),
            retry: RetryPolicy::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration with defaults and no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with credentials read from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            google_api_key: var("GOOGLE_API_KEY"),
            search_engine_id: var("SEARCH_ENGINE_ID"),
            newsapi_key: var("NEWSAPI_KEY"),
            ..Self::default()
        }
    }

    /// Sets the Google credentials.
    #[must_use]
    pub fn with_google(mut self, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        self.google_api_key = Some(api_key.into());
        self.search_engine_id = Some(engine_id.into());
        self
    }

    /// Sets the NewsAPI key.
    #[must_use]
    pub fn with_newsapi_key(mut self, key: impl Into<String>) -> Self {
        self.newsapi_key = Some(key.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the provider endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<set>");
        f.debug_struct("GatewayConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("search_engine_id", &self.search_engine_id)
            .field("newsapi_key", &redact(&self.newsapi_key))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
