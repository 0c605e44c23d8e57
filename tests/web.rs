//! Router-level tests: the page, the ask/history endpoints and session cookies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use live_search::agent::{AgentRuntime, SearchTool, Tool};
use live_search::error::{ModelError, SearchError};
use live_search::instrumentation::TurnLogger;
use live_search::llm::{ChatMessage, ChatModel, LlmResponse};
use live_search::search::{SearchProvider, SearchResultItem};
use live_search::web::{create_router, AppState};

// =============================================================================
// Helpers
// =============================================================================

/// Searches when asked about news, otherwise answers directly.
struct RuleModel;

#[async_trait]
impl ChatModel for RuleModel {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ModelError> {
        let last = &messages.last().expect("at least one message").content;
        let text = if last.starts_with("TOOL RESPONSE") {
            r#"{"action": "Final Answer", "action_input": "1. **Key Insights**: it rained"}"#
        } else if last.contains("news") {
            r#"{"action": "Google Search", "action_input": "weather news"}"#
        } else {
            r#"{"action": "Final Answer", "action_input": "Hello there"}"#
        };
        Ok(LlmResponse {
            text: text.to_string(),
            input_tokens: 100,
            output_tokens: 20,
            cost: 0.0,
        })
    }
}

struct StubSearch {
    up: bool,
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResultItem>, SearchError> {
        if !self.up {
            return Err(SearchError::Request("connection refused".into()));
        }
        Ok(vec![SearchResultItem {
            title: Some("Rain expected".into()),
            snippet: None,
            link: Some("https://weather.example".into()),
        }])
    }
}

fn make_app(search_up: bool, logger: Option<TurnLogger>) -> axum::Router {
    make_app_with_timeout(search_up, logger, Duration::from_secs(3600))
}

fn make_app_with_timeout(
    search_up: bool,
    logger: Option<TurnLogger>,
    session_timeout: Duration,
) -> axum::Router {
    let factory = move || {
        let tool: Arc<dyn Tool> = Arc::new(SearchTool::new(Arc::new(StubSearch { up: search_up })));
        AgentRuntime::new(Arc::new(RuleModel), vec![tool], 3)
    };
    create_router(AppState::new(
        Arc::new(factory),
        logger,
        session_timeout,
    ))
}

fn ask_request(query: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/ask").header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::json!({ "query": query }).to_string()))
        .unwrap()
}

fn history_request(cookie: &str) -> Request<Body> {
    Request::get("/api/history")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` part of a Set-Cookie header.
fn cookie_pair(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_index_serves_page_and_sets_cookie() {
    let app = make_app(true, None);
    let resp = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie_pair(&resp).starts_with("live_search_session="));

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Message Llama:"));
    assert!(html.contains("/api/ask"));
}

#[tokio::test]
async fn test_health() {
    let app = make_app(true, None);
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn test_ask_then_history_within_session() {
    let app = make_app(true, None);

    let resp = app.clone().oneshot(ask_request("hi", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = cookie_pair(&resp);
    let body = body_json(resp).await;
    assert_eq!(body["answer_markdown"], "Hello there");
    assert_eq!(body["answer_html"], "<p>Hello there</p>\n");
    assert_eq!(body["turns"], 2);

    let resp = app
        .clone()
        .oneshot(ask_request("any news on the weather?", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(resp).await;
    assert!(body["answer_html"]
        .as_str()
        .unwrap()
        .contains("<strong>Key Insights</strong>"));
    assert_eq!(body["turns"], 4);
    assert!(body["summary"].as_str().unwrap().starts_with("Searches: 1 | Results read: 1"));

    let resp = app.oneshot(history_request(&cookie)).await.unwrap();
    let body = body_json(resp).await;
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0]["role"], "human");
    assert_eq!(turns[0]["content"], "hi");
    assert_eq!(turns[1]["role"], "ai");
    assert_eq!(turns[2]["content"], "any news on the weather?");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = make_app(true, None);
    let resp = app.clone().oneshot(ask_request("hi", None)).await.unwrap();
    let first = cookie_pair(&resp);

    let resp = app.clone().oneshot(ask_request("hello", None)).await.unwrap();
    let second = cookie_pair(&resp);
    assert_ne!(first, second);

    let body = body_json(app.oneshot(history_request(&second)).await.unwrap()).await;
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["content"], "hello");
}

#[tokio::test]
async fn test_empty_query_is_a_warning_and_appends_nothing() {
    let app = make_app(true, None);
    let resp = app.clone().oneshot(ask_request("   ", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let cookie = cookie_pair(&resp);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "empty_query");
    assert_eq!(body["message"], "Please enter your question.");

    let body = body_json(app.oneshot(history_request(&cookie)).await.unwrap()).await;
    assert!(body["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_query_does_not_open_a_session() {
    let app = make_app(true, None);
    let resp = app.clone().oneshot(ask_request("", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["sessions"], 0);
}

#[tokio::test]
async fn test_failed_first_turn_still_sets_cookie() {
    let app = make_app(false, None);

    let resp = app
        .clone()
        .oneshot(ask_request("latest news", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let cookie = cookie_pair(&resp);

    // The follow-up lands in the same session as the failed turn.
    let resp = app
        .clone()
        .oneshot(ask_request("hi", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(resp).await["turns"], 2);

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["sessions"], 1);
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let app = make_app_with_timeout(true, None, Duration::from_millis(50));

    let resp = app.clone().oneshot(ask_request("hi", None)).await.unwrap();
    let stale = cookie_pair(&resp);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let resp = app.clone().oneshot(ask_request("hello", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["sessions"], 1);

    let body = body_json(app.oneshot(history_request(&stale)).await.unwrap()).await;
    assert!(body["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_outage_reports_error_and_keeps_history() {
    let app = make_app(false, None);

    let resp = app.clone().oneshot(ask_request("hi", None)).await.unwrap();
    let cookie = cookie_pair(&resp);

    let resp = app
        .clone()
        .oneshot(ask_request("latest news", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "search_unavailable");
    assert_eq!(body["message"], "Error retrieving search results.");
    assert!(body["detail"].as_str().unwrap().contains("connection refused"));

    let body = body_json(app.oneshot(history_request(&cookie)).await.unwrap()).await;
    assert_eq!(body["turns"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_completed_turns_are_logged() {
    let dir = tempfile::tempdir().unwrap();
    let logger = TurnLogger::new(dir.path()).unwrap();
    let app = make_app(true, Some(logger));

    let resp = app.clone().oneshot(ask_request("hi", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.oneshot(ask_request("", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let contents = std::fs::read_to_string(dir.path().join("turns.jsonl")).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let log: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(log["query"], "hi");
    assert_eq!(log["answer"], "Hello there");
}
