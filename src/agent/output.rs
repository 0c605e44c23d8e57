use serde::Deserialize;

pub const FINAL_ANSWER: &str = "Final Answer";

#[derive(Debug, PartialEq, Eq)]
pub enum AgentAction {
    UseTool { tool: String, input: String },
    Finish(String),
}

#[derive(Deserialize)]
struct ActionBlob {
    action: String,
    action_input: serde_json::Value,
}

/// Parse the model's `{"action": .., "action_input": ..}` reply.
///
/// The blob may be wrapped in a fenced code block or surrounded by prose.
pub fn parse_action(text: &str) -> Result<AgentAction, String> {
    let json_str = extract_json(text).ok_or_else(|| "no JSON object found".to_string())?;
    let blob: ActionBlob = serde_json::from_str(json_str).map_err(|e| e.to_string())?;

    let input = match blob.action_input {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };

    if blob.action.trim() == FINAL_ANSWER {
        Ok(AgentAction::Finish(input))
    } else {
        Ok(AgentAction::UseTool {
            tool: blob.action.trim().to_string(),
            input,
        })
    }
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
