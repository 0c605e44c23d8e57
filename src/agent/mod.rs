pub mod output;
pub mod tool;

use std::sync::Arc;
use std::time::Instant;

use crate::conversation::Role;
use crate::error::AgentError;
use crate::instrumentation::ToolCallLog;
use crate::llm::{ChatMessage, ChatModel};
use crate::prompt::{fill_template, PromptEnvelope};

use output::{parse_action, AgentAction, FINAL_ANSWER};
pub use tool::{SearchTool, Tool, ToolOutput};

const SYSTEM_PROMPT: &str = r#"You are a research assistant with access to live web search. You can answer directly from what you already know, or use a tool first when the question needs current or specific information.

TOOLS
------
{tools}

RESPONSE FORMAT
---------------
Always reply with a markdown code snippet containing a single JSON object, and nothing else. Use one of two shapes.

To use a tool:
```json
{
    "action": string, \\ one of [{tool_names}]
    "action_input": string \\ the input to the tool
}
```

To answer the user:
```json
{
    "action": "Final Answer",
    "action_input": string \\ your full answer, in markdown
}
```"#;

const FORMAT_CORRECTION: &str = "Your last reply could not be parsed. Reply again with exactly one markdown code snippet containing a JSON object with \"action\" and \"action_input\" keys, and nothing else.";

/// Result of one completed agent run.
#[derive(Debug, Clone, Default)]
pub struct Answer {
    pub text: String,
    pub tool_calls: Vec<ToolCallLog>,
    pub model_calls: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
}

pub struct AgentRuntime {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
}

impl AgentRuntime {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>, max_iterations: usize) -> Self {
        Self {
            model,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Drive the model until it gives a final answer, calling tools on request.
    #[tracing::instrument(skip_all, fields(query = %envelope.current_query))]
    pub async fn run(&self, envelope: &PromptEnvelope) -> Result<Answer, AgentError> {
        let mut messages = self.initial_messages(envelope);
        let mut current = envelope.clone();
        let mut answer = Answer::default();
        let mut parse_failure: Option<String> = None;

        for iteration in 0..self.max_iterations {
            let response = self.model.chat(&messages).await?;
            answer.model_calls += 1;
            answer.input_tokens += response.input_tokens;
            answer.output_tokens += response.output_tokens;
            answer.cost += response.cost;

            let action = match parse_action(&response.text) {
                Ok(action) => action,
                Err(detail) => {
                    tracing::warn!(iteration, %detail, "unparseable model output");
                    parse_failure = Some(detail);
                    messages.push(ChatMessage::assistant(response.text));
                    messages.push(ChatMessage::user(FORMAT_CORRECTION));
                    continue;
                }
            };
            parse_failure = None;

            match action {
                AgentAction::Finish(text) => {
                    tracing::info!(
                        iterations = iteration + 1,
                        searches = answer.tool_calls.len(),
                        "final answer"
                    );
                    answer.text = text;
                    return Ok(answer);
                }
                AgentAction::UseTool { tool, input } => {
                    let observation = match self.find_tool(&tool) {
                        Some(t) => {
                            let started = Instant::now();
                            let output = t.call(&input).await.map_err(|source| {
                                AgentError::ToolInvocation {
                                    tool: tool.clone(),
                                    source,
                                }
                            })?;
                            let latency_ms = started.elapsed().as_millis() as u64;
                            tracing::info!(%tool, %input, results = output.result_count, latency_ms, "tool call");
                            answer.tool_calls.push(ToolCallLog {
                                tool: tool.clone(),
                                query: input,
                                num_results: output.result_count as u32,
                                latency_ms,
                            });
                            current = current.with_search_block(output.block);
                            tool_response(&current)
                        }
                        None => format!(
                            "{} is not a valid tool, try one of [{}].",
                            tool,
                            self.tool_names()
                        ),
                    };
                    messages.push(ChatMessage::assistant(response.text));
                    messages.push(ChatMessage::user(observation));
                }
            }
        }

        Err(match parse_failure {
            Some(detail) => AgentError::MalformedResponse(detail),
            None => AgentError::IterationLimit(self.max_iterations),
        })
    }

    fn initial_messages(&self, envelope: &PromptEnvelope) -> Vec<ChatMessage> {
        let tools = self
            .tools
            .iter()
            .map(|t| format!("> {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let tool_names = format!("{}, {:?}", self.tool_names(), FINAL_ANSWER);
        let system = fill_template(
            SYSTEM_PROMPT,
            &[("tools", &tools), ("tool_names", &tool_names)],
        );

        let mut messages = Vec::with_capacity(envelope.history.len() + 2);
        messages.push(ChatMessage::system(system));
        for turn in &envelope.history {
            messages.push(match turn.role() {
                Role::Human => ChatMessage::user(turn.content()),
                Role::Ai => ChatMessage::assistant(turn.content()),
            });
        }
        messages.push(ChatMessage::user(envelope.render()));
        messages
    }

    fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    fn tool_names(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{:?}", t.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn tool_response(envelope: &PromptEnvelope) -> String {
    let block = envelope
        .search_block
        .as_ref()
        .map(|b| b.as_str())
        .unwrap_or_default();
    format!(
        "TOOL RESPONSE:\n---------------------\n{}\n\nUSER'S INPUT\n--------------------\nUsing the tool response above, answer my last question: {}\n\nRemember to reply with a single JSON action and nothing else.",
        block, envelope.current_query
    )
}

/// Builds the per-session agent on first use.
pub trait AgentFactory: Send + Sync {
    fn build(&self) -> AgentRuntime;
}

impl<F> AgentFactory for F
where
    F: Fn() -> AgentRuntime + Send + Sync,
{
    fn build(&self) -> AgentRuntime {
        self()
    }
}

/// Factory wiring the hosted model to the web search tool.
pub struct ClientAgentFactory {
    model: Arc<dyn ChatModel>,
    search: Arc<dyn crate::search::SearchProvider>,
    max_iterations: usize,
}

impl ClientAgentFactory {
    pub fn new(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn crate::search::SearchProvider>,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            search,
            max_iterations,
        }
    }
}

impl AgentFactory for ClientAgentFactory {
    fn build(&self) -> AgentRuntime {
        let search: Arc<dyn Tool> = Arc::new(SearchTool::new(self.search.clone()));
        AgentRuntime::new(self.model.clone(), vec![search], self.max_iterations)
    }
}
