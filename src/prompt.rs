//! Prompt assembly: system template + history + current query.

use crate::conversation::{ConversationStore, ConversationTurn};
use crate::search::FormattedSearchBlock;

pub const SYSTEM_TEMPLATE: &str = r#"You are an assistant capable of browsing the internet and answering questions based on search results. You will remember prior conversations and take them into account for a more accurate response. Return your answers in markdown format.

Here is the context of the conversation:
{chat_history}

Now, answer the following question based on your previous conversation and the current query:
{query}"#;

/// Everything the agent needs for one turn. Built fresh each time.
#[derive(Debug, Clone)]
pub struct PromptEnvelope {
    pub system_instructions: String,
    pub history: Vec<ConversationTurn>,
    pub search_block: Option<FormattedSearchBlock>,
    pub current_query: String,
}

impl PromptEnvelope {
    pub fn with_search_block(mut self, block: FormattedSearchBlock) -> Self {
        self.search_block = Some(block);
        self
    }

    /// The text handed to the model as the current user input.
    pub fn render(&self) -> String {
        match &self.search_block {
            Some(block) => format!("{}\n\n{}", self.system_instructions, block),
            None => self.system_instructions.clone(),
        }
    }
}

pub fn assemble(template: &str, history: &ConversationStore, query: &str) -> PromptEnvelope {
    let chat_history = history.serialize();
    PromptEnvelope {
        system_instructions: fill_template(
            template,
            &[("chat_history", &chat_history), ("query", query)],
        ),
        history: history.all().to_vec(),
        search_block: None,
        current_query: query.to_string(),
    }
}

/// Single-pass `{name}` substitution.
///
/// Only placeholders in `template` are expanded; substituted values are
/// copied through untouched, so braces inside user text stay literal.
/// Unknown placeholders are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
