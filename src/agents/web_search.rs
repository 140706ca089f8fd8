//! Web search agent: retrieves and normalizes search results behind a
//! provider trait, an external boundary shaped like a `Completer`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RESULTS: u32 = 6;
pub const MAX_RESULTS_CAP: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchResultItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub source: String,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchResult {
    pub query: String,
    pub provider: String,
    #[serde(default)]
    pub results: Vec<WebSearchResultItem>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    pub weak_results: bool,
    pub follow_up_question: Option<String>,
}

impl WebSearchResult {
    /// Search results recast as documents, for promotion into deep-research
    /// evidence or DocRetrieval step input.
    pub fn to_documents(&self) -> Vec<serde_json::Value> {
        self.results
            .iter()
            .map(|r| serde_json::json!({"title": r.title, "snippet": r.snippet, "url": r.url, "source": r.source}))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("search provider failed: {0}")]
    Provider(String),

    #[error("search timed out")]
    Timeout,
}

#[derive(Debug, Clone)]
pub struct WebSearchParams {
    pub query: String,
    pub max_results: u32,
    pub region: Option<String>,
    pub safe_search: Option<String>,
    pub timebox_seconds: u32,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, params: &WebSearchParams) -> Result<Vec<WebSearchResultItem>, WebSearchError>;
}

pub struct WebSearchAgent {
    provider: std::sync::Arc<dyn WebSearchProvider>,
}

impl WebSearchAgent {
    pub fn new(provider: std::sync::Arc<dyn WebSearchProvider>) -> Self {
        Self { provider }
    }

    pub async fn run(&self, mut params: WebSearchParams) -> WebSearchResult {
        params.max_results = params.max_results.clamp(1, MAX_RESULTS_CAP);
        let mut result = WebSearchResult {
            query: params.query.clone(),
            provider: self.provider.name().to_string(),
            ..Default::default()
        };
        match self.provider.search(&params).await {
            Ok(items) => {
                result.weak_results = items.len() < 2;
                result.citations = items.iter().map(|i| i.url.clone()).collect();
                result.results = items;
            }
            Err(err) => {
                result.warnings.push(err.to_string());
                result.weak_results = true;
            }
        }
        if result.weak_results {
            result.follow_up_question = Some(format!("Could you narrow down what you mean by \"{}\"?", params.query));
        }
        result
    }
}

/// A deterministic test double that returns a fixed set of results,
/// never reaching the network.
pub struct StubWebSearchProvider {
    pub fixed_results: Vec<WebSearchResultItem>,
}

#[async_trait]
impl WebSearchProvider for StubWebSearchProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, params: &WebSearchParams) -> Result<Vec<WebSearchResultItem>, WebSearchError> {
        Ok(self.fixed_results.iter().take(params.max_results as usize).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(rank: u32, url: &str) -> WebSearchResultItem {
        WebSearchResultItem {
            title: format!("Result {rank}"),
            url: url.to_string(),
            snippet: "snippet".into(),
            source: "example.com".into(),
            rank,
        }
    }

    #[tokio::test]
    async fn test_weak_results_triggers_follow_up_question() {
        let agent = WebSearchAgent::new(std::sync::Arc::new(StubWebSearchProvider {
            fixed_results: vec![item(1, "https://example.com/a")],
        }));
        let result = agent
            .run(WebSearchParams { query: "acme".into(), max_results: 5, region: None, safe_search: None, timebox_seconds: 10 })
            .await;
        assert!(result.weak_results);
        assert!(result.follow_up_question.is_some());
    }

    #[tokio::test]
    async fn test_citations_mirror_result_urls() {
        let agent = WebSearchAgent::new(std::sync::Arc::new(StubWebSearchProvider {
            fixed_results: vec![item(1, "https://a.com"), item(2, "https://b.com"), item(3, "https://c.com")],
        }));
        let result = agent
            .run(WebSearchParams { query: "acme".into(), max_results: 5, region: None, safe_search: None, timebox_seconds: 10 })
            .await;
        assert_eq!(result.citations, vec!["https://a.com", "https://b.com", "https://c.com"]);
        assert!(!result.weak_results);
    }
}
