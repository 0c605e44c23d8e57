use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::markdown::render_markdown;
use super::{AppState, INDEX_HTML, SESSION_COOKIE};
use crate::conversation::ConversationTurn;
use crate::error::TurnError;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer_markdown: String,
    pub answer_html: String,
    pub turns: usize,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

pub async fn index(headers: HeaderMap) -> Response {
    let (_, cookie) = session_id(&headers);
    with_cookie(Html(INDEX_HTML), cookie)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.len(),
    })
}

pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Response {
    let (id, cookie) = session_id(&headers);
    // A blank message never opens a session.
    if request.query.trim().is_empty() {
        return with_cookie(ApiError(TurnError::EmptyQuery), cookie);
    }

    let session = state.sessions.get_or_create(id);
    let mut session = session.lock().await;

    let turn_log = match session.submit(&request.query, state.factory.as_ref()).await {
        Ok(turn_log) => turn_log,
        Err(e) => return with_cookie(ApiError(e), cookie),
    };

    if let Some(logger) = &state.logger {
        if let Err(e) = logger.write(&turn_log) {
            tracing::warn!(error = %e, "failed to write turn log");
        }
    }

    let body = AskResponse {
        answer_html: render_markdown(&turn_log.answer),
        summary: turn_log.summary(),
        turns: session.history().len(),
        answer_markdown: turn_log.answer,
    };
    with_cookie(Json(body), cookie)
}

pub async fn history(State(state): State<AppState>, headers: HeaderMap) -> Json<HistoryResponse> {
    let (id, _) = session_id(&headers);
    let turns = match state.sessions.get(&id) {
        Some(session) => session.lock().await.history().all().to_vec(),
        None => Vec::new(),
    };
    Json(HistoryResponse { turns })
}

/// Session id from the request cookie, or a new one plus the cookie to set.
fn session_id(headers: &HeaderMap) -> (Uuid, Option<HeaderValue>) {
    let existing = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

    match existing {
        Some(id) => (id, None),
        None => {
            let id = Uuid::new_v4();
            let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Strict");
            (id, HeaderValue::from_str(&cookie).ok())
        }
    }
}

fn with_cookie(body: impl IntoResponse, cookie: Option<HeaderValue>) -> Response {
    let mut response = body.into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}
