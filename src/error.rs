//! Error types for every stage of a turn.
//!
//! Each failure domain gets its own enum so callers can tell a dead search
//! provider from a confused model. Nothing here decides how an error is
//! displayed; the web and CLI layers do that.

/// Startup configuration failures. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// The search provider could not produce results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search unavailable: {0}")]
    Request(String),
    #[error("search unavailable: provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("search unavailable: malformed response: {0}")]
    Malformed(String),
}

/// The model provider could not produce a completion.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("tool `{tool}` failed: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: SearchError,
    },
    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),
    #[error("could not parse model output: {0}")]
    MalformedResponse(String),
    #[error("no final answer after {0} iterations")]
    IterationLimit(usize),
}

/// Why a submitted turn did not produce an answer.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("message cannot be empty")]
    EmptyQuery,
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl TurnError {
    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            TurnError::EmptyQuery => "empty_query",
            TurnError::Agent(AgentError::ToolInvocation { .. }) => "search_unavailable",
            TurnError::Agent(AgentError::ModelInvocation(_)) => "model_invocation",
            TurnError::Agent(AgentError::MalformedResponse(_)) => "malformed_response",
            TurnError::Agent(AgentError::IterationLimit(_)) => "iteration_limit",
        }
    }

    /// Message shown to the person at the keyboard.
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::EmptyQuery => "Please enter your question.",
            TurnError::Agent(AgentError::ToolInvocation { .. }) => {
                "Error retrieving search results."
            }
            TurnError::Agent(AgentError::ModelInvocation(_)) => {
                "The language model could not be reached."
            }
            TurnError::Agent(AgentError::MalformedResponse(_))
            | TurnError::Agent(AgentError::IterationLimit(_)) => {
                "An error occurred while processing your request."
            }
        }
    }
}
