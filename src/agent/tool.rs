use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SearchError;
use crate::search::{format_results, FormattedSearchBlock, SearchProvider};

pub struct ToolOutput {
    pub block: FormattedSearchBlock,
    pub result_count: usize,
}

/// A capability the model may invoke while reasoning.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, input: &str) -> Result<ToolOutput, SearchError>;
}

/// Web search exposed to the model: search, then format for analysis.
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl SearchTool {
    pub const NAME: &'static str = "Google Search";

    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Retrieve information from Google Programmable Search Engine."
    }

    async fn call(&self, input: &str) -> Result<ToolOutput, SearchError> {
        let results = self.provider.search(input).await?;
        Ok(ToolOutput {
            result_count: results.len(),
            block: format_results(input, &results),
        })
    }
}
