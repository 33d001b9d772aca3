//! Search source identities and the pluggable source trait.

use std::fmt;

use async_trait::async_trait;

use crate::error::SearchError;

/// The closed set of search sources the step executor can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// Google Custom Search.
    Google,
    /// ArXiv paper search.
    Arxiv,
    /// NewsAPI article search.
    NewsApi,
    /// SEC EDGAR company lookup.
    Sec,
    /// Wikipedia intro extracts.
    Wikipedia,
}

impl Source {
    /// All sources, in tool-menu order.
    pub const ALL: [Self; 5] = [
        Self::Google,
        Self::Arxiv,
        Self::NewsApi,
        Self::Sec,
        Self::Wikipedia,
    ];

    /// Short lowercase name (`google`, `arxiv`, `newsapi`, `sec`, `wikipedia`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Arxiv => "arxiv",
            Self::NewsApi => "newsapi",
            Self::Sec => "sec",
            Self::Wikipedia => "wikipedia",
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Arxiv => "ArXiv",
            Self::NewsApi => "NewsAPI",
            Self::Sec => "SEC",
            Self::Wikipedia => "Wikipedia",
        }
    }

    /// Function name offered to the model for this source.
    #[must_use]
    pub const fn tool_name(self) -> &'static str {
        match self {
            Self::Google => "search_google_api",
            Self::Arxiv => "search_arxiv_api",
            Self::NewsApi => "search_newsapi_api",
            Self::Sec => "search_sec_api",
            Self::Wikipedia => "search_wikipedia_api",
        }
    }

    /// Function description offered to the model.
    #[must_use]
    pub const fn tool_description(self) -> &'static str {
        match self {
            Self::Google => "Searches Google and returns relevant web results for a query.",
            Self::Arxiv => "Searches ArXiv and returns relevant results for a query.",
            Self::NewsApi => "Searches NewsAPI and returns relevant news articles for a query.",
            Self::Sec => "Searches SEC and returns relevant filings for a query.",
            Self::Wikipedia => "Searches Wikipedia and returns relevant extracts for a query.",
        }
    }

    /// Prefix used when a failure is folded into a result string.
    #[must_use]
    pub const fn error_label(self) -> &'static str {
        match self {
            Self::Google => "Google Search Error",
            Self::Arxiv => "ArXiv Search Error",
            Self::NewsApi => "NewsAPI Error",
            Self::Sec => "SEC API Error",
            Self::Wikipedia => "Wikipedia Error",
        }
    }

    /// Looks up a source by short name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Looks up a source by its tool function name.
    #[must_use]
    pub fn from_tool_name(tool: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tool_name() == tool)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A search backend for one [`Source`].
///
/// Implementations perform a single attempt and return formatted result
/// entries; retrying and error folding happen in the gateway.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Runs one search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, status, or payload failures.
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}
