use std::fmt;

use super::SearchResultItem;
use crate::prompt::fill_template;

const ANALYSIS_TEMPLATE: &str = r#"I have the following search results related to "{query}". Please analyze these results and provide a comprehensive, well-structured summary. Include the most relevant insights, comparisons (if applicable), and any notable trends or points. Format the summary as follows:

1. **Key Insights**: Provide the most important takeaways from the search results.
2. **Detailed Explanation**: Expand on the context and details provided in the results, offering a deeper understanding of the topic.
3. **Examples or Case Studies** (if applicable): Include any examples or case studies mentioned in the results that illustrate the key points.
4. **Conclusion**: Summarize the overall implications or significance of the findings.

Here are the search results:
{search_results}

Make sure to provide a clear and concise answer with structured sections for easy reading."#;

/// Section headers the analysis template asks the model to produce.
pub const SECTION_HEADERS: [&str; 4] = [
    "**Key Insights**",
    "**Detailed Explanation**",
    "**Examples or Case Studies**",
    "**Conclusion**",
];

/// Search results wrapped in analysis instructions, ready for a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedSearchBlock(String);

impl FormattedSearchBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedSearchBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render results in the order given. Never fails; an empty list yields the
/// template with an empty results section.
pub fn format_results(query: &str, results: &[SearchResultItem]) -> FormattedSearchBlock {
    let entries = results
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n\n");

    FormattedSearchBlock(fill_template(
        ANALYSIS_TEMPLATE,
        &[("query", query), ("search_results", &entries)],
    ))
}

fn format_entry(item: &SearchResultItem) -> String {
    format!(
        "**Title**: {}\n**Snippet**: {}\n**Link**: {}",
        or_fallback(&item.title, "No Title"),
        or_fallback(&item.snippet, "No Snippet"),
        or_fallback(&item.link, "No Link"),
    )
}

fn or_fallback<'a>(field: &'a Option<String>, fallback: &'a str) -> &'a str {
    match field.as_deref() {
        Some(value) if !value.trim().is_empty() => value,
        _ => fallback,
    }
}
