//! WebSocket upgrade + message loop. Each connection owns one practice `Session`.
//!
//! Client messages are parsed as JSON and applied to the session; reviews run in
//! spawned tasks and report back through a channel so the loop keeps serving
//! the learner while a review is in flight.

use std::fmt::Display;
use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, Instrument};
use uuid::Uuid;

use crate::domain::ReviewResult;
use crate::error::ConfigError;
use crate::logic::{finish_review, handle_action, run_review, Step};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{Session, Ticket};
use crate::state::AppState;

type ReviewDone = (Ticket, Result<ReviewResult, ConfigError>);

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "algoclone", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(session_id = %Uuid::new_v4()))]
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
  info!(target: "algoclone", "WebSocket connected");
  let (outgoing, incoming) = socket.split();
  run_session(state, incoming, outgoing).await;
  info!(target: "algoclone", "WebSocket disconnected");
}

/// Serve one session until the client closes or a send fails.
async fn run_session<R, W, E>(state: Arc<AppState>, mut incoming: R, mut outgoing: W)
where
  R: Stream<Item = Result<Message, E>> + Unpin,
  W: Sink<Message> + Unpin,
  W::Error: Display,
{
  let mut session = Session::new();
  let (done_tx, mut done_rx) = mpsc::channel::<ReviewDone>(4);

  loop {
    let replies = tokio::select! {
      frame = incoming.next() => {
        let Some(Ok(msg)) = frame else { break };
        match msg {
          Message::Text(txt) => {
            let step = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(parsed) => {
                debug!(target: "algoclone", "WS received: {:?}", &parsed);
                handle_action(&state, &mut session, parsed)
              }
              Err(e) => Step { replies: vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }], pending: None },
            };
            if let Some(pending) = step.pending {
              let state = state.clone();
              let tx = done_tx.clone();
              tokio::spawn(
                async move {
                  let outcome = run_review(&state, &pending.request).await;
                  // Receiver is gone only if the connection closed; nothing to apply then.
                  let _ = tx.send((pending.ticket, outcome)).await;
                }
                .in_current_span(),
              );
            }
            step.replies
          }
          Message::Ping(payload) => {
            let _ = outgoing.send(Message::Pong(payload)).await;
            continue;
          }
          Message::Close(_) => break,
          _ => continue,
        }
      }
      Some((ticket, outcome)) = done_rx.recv() => {
        finish_review(&state, &mut session, &ticket, outcome)
      }
    };

    for reply in replies {
      let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      if let Err(e) = outgoing.send(Message::Text(out)).await {
        error!(target: "algoclone", error = %e, "WS send error");
        return;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
  use serde_json::{json, Value};

  use crate::catalog::{seed_problems, Catalog};
  use crate::review::tests::{client_with, StubBackend, GOOD_REPLY};

  type Inbound = UnboundedSender<Result<Message, axum::Error>>;

  struct Client {
    tx: Inbound,
    rx: UnboundedReceiver<Message>,
    task: tokio::task::JoinHandle<()>,
  }

  fn connect(backend: Arc<StubBackend>) -> Client {
    let state = Arc::new(AppState::with_reviewer(Catalog::new(seed_problems()), Ok(client_with(backend))));
    let (tx, incoming) = unbounded();
    let (outgoing, rx) = unbounded();
    let task = tokio::spawn(run_session(state, incoming, outgoing));
    Client { tx, rx, task }
  }

  fn slow(delay: Duration) -> Arc<StubBackend> {
    Arc::new(StubBackend { delay: Some(delay), ..StubBackend::ok(GOOD_REPLY) })
  }

  impl Client {
    fn send(&self, v: Value) {
      self.tx.unbounded_send(Ok(Message::Text(v.to_string()))).unwrap();
    }

    async fn recv(&mut self) -> Value {
      let frame = tokio::time::timeout(Duration::from_secs(2), self.rx.next()).await.unwrap().unwrap();
      match frame {
        Message::Text(t) => serde_json::from_str(&t).unwrap(),
        other => panic!("unexpected frame {other:?}"),
      }
    }
  }

  #[tokio::test]
  async fn loop_keeps_serving_while_a_review_runs() {
    let backend = slow(Duration::from_millis(200));
    let mut c = connect(backend.clone());

    c.send(json!({ "type": "select_problem", "problemId": "binary-search" }));
    assert_eq!(c.recv().await["session"]["phase"], "Idle");
    c.send(json!({ "type": "submit", "code": "left = 0" }));
    assert_eq!(c.recv().await["session"]["phase"], "Analyzing");

    c.send(json!({ "type": "ping" }));
    assert_eq!(c.recv().await["type"], "pong");

    let review = c.recv().await;
    assert_eq!(review["type"], "review");
    assert_eq!(review["result"]["score"], 95);
    assert_eq!(c.recv().await["session"]["phase"], "Reviewed");
    assert_eq!(backend.calls(), 1);
  }

  #[tokio::test]
  async fn late_review_after_switch_is_never_sent() {
    let backend = slow(Duration::from_millis(100));
    let mut c = connect(backend.clone());

    c.send(json!({ "type": "select_problem", "problemId": "binary-search" }));
    c.recv().await;
    c.send(json!({ "type": "submit", "code": "left = 0" }));
    c.recv().await;
    c.send(json!({ "type": "select_problem", "problemId": "merge-sort", "confirmed": true }));
    let switched = c.recv().await;
    assert_eq!(switched["session"]["problemId"], "merge-sort");
    assert_eq!(switched["session"]["phase"], "Idle");

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(backend.calls(), 1);

    // The next frame answers this ping; the stale review produced nothing.
    c.send(json!({ "type": "ping" }));
    assert_eq!(c.recv().await["type"], "pong");
    c.send(json!({ "type": "edit", "code": "def merge_sort(arr):" }));
    let snap = c.recv().await;
    assert_eq!(snap["session"]["problemId"], "merge-sort");
    assert!(snap["session"].get("result").is_none());
  }

  #[tokio::test]
  async fn bad_json_is_reported_and_close_ends_the_loop() {
    let mut c = connect(Arc::new(StubBackend::ok(GOOD_REPLY)));

    c.tx.unbounded_send(Ok(Message::Text("{not json".into()))).unwrap();
    let err = c.recv().await;
    assert_eq!(err["type"], "error");
    assert!(err["message"].as_str().unwrap().starts_with("Invalid JSON"));

    c.tx.unbounded_send(Ok(Message::Close(None))).unwrap();
    tokio::time::timeout(Duration::from_secs(2), c.task).await.unwrap().unwrap();
    assert!(c.rx.next().await.is_none());
  }
}
