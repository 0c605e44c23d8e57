pub mod formatter;
pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

pub use formatter::{format_results, FormattedSearchBlock};
pub use google::GoogleSearchClient;

/// One hit from the search provider. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query, returning hits in provider order.
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, SearchError>;
}
