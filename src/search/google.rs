use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchProvider, SearchResultItem};
use crate::error::SearchError;

/// Client for the Google Programmable Search JSON API.
#[derive(Debug, Clone)]
pub struct GoogleSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cse_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResultItem>,
}

impl GoogleSearchClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        cse_id: &str,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            cse_id: cse_id.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    #[tracing::instrument(skip(self), fields(results))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, SearchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.without_url().to_string()))?;
        let items = parse_response(&body)?;

        tracing::Span::current().record("results", items.len());
        Ok(items)
    }
}

fn parse_response(body: &str) -> Result<Vec<SearchResultItem>, SearchError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|r| r.items)
        .map_err(|e| SearchError::Malformed(e.to_string()))
}
