//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::logic::{hint_text, list_problems, one_shot_review, OneShotError};
use crate::protocol::*;
use crate::state::AppState;

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
  (status, Json(ErrorOut { error: error.into() })).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_problems(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProblemQuery>,
) -> impl IntoResponse {
  let problems = list_problems(&state, &q);
  info!(target: "catalog", count = problems.len(), "HTTP problems served");
  Json(problems)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_problem(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Response {
  match state.catalog.get(&id) {
    Some(p) => Json(p.as_ref().clone()).into_response(),
    None => error_response(StatusCode::NOT_FOUND, format!("Unknown problem: {id}")),
  }
}

#[instrument(level = "info", skip(state), fields(%q.problem_id))]
pub async fn http_get_hint(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HintQuery>,
) -> Response {
  match hint_text(&state, &q.problem_id) {
    Some(text) => Json(HintOut { text }).into_response(),
    None => error_response(StatusCode::NOT_FOUND, format!("Unknown problem: {}", q.problem_id)),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.problem_id, code_len = body.code.len()))]
pub async fn http_post_review(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReviewIn>,
) -> Response {
  match one_shot_review(&state, &body.problem_id, &body.code).await {
    Ok(result) => {
      info!(target: "session", id = %body.problem_id, score = result.score, correct = result.is_correct, "HTTP review evaluated");
      Json(result).into_response()
    }
    Err(OneShotError::UnknownProblem(id)) => error_response(StatusCode::NOT_FOUND, format!("Unknown problem: {id}")),
    Err(OneShotError::EmptySubmission) => error_response(StatusCode::BAD_REQUEST, "Submission is empty"),
    Err(OneShotError::Config(e)) => {
      warn!(target: "session", error = %e, "HTTP review rejected: configuration");
      error_response(StatusCode::SERVICE_UNAVAILABLE, format!("{} ({e})", state.messages.config_error))
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::{to_bytes, Body}, http::{Request, StatusCode}};
  use serde_json::Value;
  use tower::ServiceExt;

  use crate::catalog::{seed_problems, Catalog};
  use crate::review::tests::{client_with, StubBackend, GOOD_REPLY};
  use crate::routes::build_router;
  use crate::state::AppState;

  fn app(backend: Arc<StubBackend>) -> axum::Router {
    build_router(Arc::new(AppState::with_reviewer(Catalog::new(seed_problems()), Ok(client_with(backend)))))
  }

  async fn call(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = call(app(Arc::new(StubBackend::ok(GOOD_REPLY))), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
  }

  #[tokio::test]
  async fn lists_and_filters_problems() {
    let backend = Arc::new(StubBackend::ok(GOOD_REPLY));
    let (status, body) = call(app(backend.clone()), get("/api/v1/problems")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), seed_problems().len());
    assert_eq!(body[0]["id"], "binary-search");
    assert!(body[0].get("referenceCode").is_none());

    let (_, body) = call(app(backend), get("/api/v1/problems?difficulty=Medium")).await;
    assert!(body.as_array().unwrap().iter().all(|p| p["difficulty"] == "Medium"));
  }

  #[tokio::test]
  async fn problem_detail_and_404() {
    let backend = Arc::new(StubBackend::ok(GOOD_REPLY));
    let (status, body) = call(app(backend.clone()), get("/api/v1/problems/bfs-iterative")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["referenceCode"].as_str().unwrap().contains("deque"));
    assert!(body["testCases"].is_array());

    let (status, body) = call(app(backend), get("/api/v1/problems/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
  }

  #[tokio::test]
  async fn hint_endpoint() {
    let backend = Arc::new(StubBackend::ok(GOOD_REPLY));
    let (status, body) = call(app(backend.clone()), get("/api/v1/hint?problemId=merge-sort")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["text"].as_str().unwrap().is_empty());
    let (status, _) = call(app(backend), get("/api/v1/hint?problemId=nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn review_endpoint_guards_and_evaluates() {
    let backend = Arc::new(StubBackend::ok(GOOD_REPLY));
    let (status, _) = call(
      app(backend.clone()),
      post_json("/api/v1/review", serde_json::json!({ "problemId": "binary-search", "code": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(backend.calls(), 0);

    let (status, body) = call(
      app(backend.clone()),
      post_json("/api/v1/review", serde_json::json!({ "problemId": "binary-search", "code": "left = 0" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 95);
    assert_eq!(body["isCorrect"], true);
    assert_eq!(backend.calls(), 1);
  }

  #[tokio::test]
  async fn review_endpoint_returns_fallback_on_backend_failure() {
    let backend = Arc::new(StubBackend::failing());
    let (status, body) = call(
      app(backend),
      post_json("/api/v1/review", serde_json::json!({ "problemId": "fibonacci-dp", "code": "a, b = 0, 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 0);
    assert_eq!(body["timeComplexity"], "Unknown");
  }
}
