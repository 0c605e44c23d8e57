use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{AgentError, TurnError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "search_unavailable").
    pub error: String,
    /// Message meant for the person using the page.
    pub message: String,
    /// Underlying fault, for the operator.
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError(pub TurnError);

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TurnError::EmptyQuery => StatusCode::BAD_REQUEST,
            TurnError::Agent(AgentError::IterationLimit(_)) => StatusCode::GATEWAY_TIMEOUT,
            TurnError::Agent(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.code().to_string(),
            message: self.0.user_message().to_string(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, SearchError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(TurnError::EmptyQuery).status(), StatusCode::BAD_REQUEST);

        let search = TurnError::Agent(AgentError::ToolInvocation {
            tool: "Google Search".into(),
            source: SearchError::Malformed("eof".into()),
        });
        assert_eq!(ApiError(search).status(), StatusCode::BAD_GATEWAY);

        let model = TurnError::Agent(ModelError::Request("timeout".into()).into());
        assert_eq!(ApiError(model).status(), StatusCode::BAD_GATEWAY);

        let limit = TurnError::Agent(AgentError::IterationLimit(5));
        assert_eq!(ApiError(limit).status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
