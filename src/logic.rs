//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Applying learner actions to a `Session` (with the confirmation round-trip)
//!   - Running reviews and committing their outcome (stale-result guard)
//!   - Catalog listing and hints
//!   - The stateless one-shot review used by the HTTP API

use tracing::{debug, info, instrument, warn};

use crate::domain::ReviewResult;
use crate::error::ConfigError;
use crate::prompt::{build_review_request, ReviewRequest};
use crate::protocol::{to_summary, ClientWsMessage, ProblemQuery, ProblemSummary, ServerWsMessage};
use crate::session::{Completion, ConfirmPrompt, Navigation, PendingReview, Session, Ticket};
use crate::state::AppState;
use crate::util::is_blank;

/// Replies to send now, plus a review to start (at most one).
#[derive(Debug, Default)]
pub struct Step {
  pub replies: Vec<ServerWsMessage>,
  pub pending: Option<PendingReview>,
}

impl Step {
  fn reply(msg: ServerWsMessage) -> Self {
    Self { replies: vec![msg], pending: None }
  }
}

fn snapshot(session: &Session) -> ServerWsMessage {
  ServerWsMessage::Session { session: session.snapshot() }
}

fn confirm_text(state: &AppState, prompt: ConfirmPrompt) -> String {
  match prompt {
    ConfirmPrompt::SwitchProblem => state.messages.confirm_switch_problem.clone(),
    ConfirmPrompt::ReturnToCatalog => state.messages.confirm_return_to_catalog.clone(),
    ConfirmPrompt::Reset => state.messages.confirm_reset.clone(),
  }
}

fn navigation_reply(state: &AppState, session: &Session, nav: Navigation) -> Step {
  match nav {
    Navigation::Applied | Navigation::Ignored => Step::reply(snapshot(session)),
    Navigation::Declined(action) => Step::reply(ServerWsMessage::ConfirmRequired {
      action,
      message: confirm_text(state, action),
    }),
  }
}

/// Apply one client message to the connection's session.
#[instrument(level = "debug", skip(state, session))]
pub fn handle_action(state: &AppState, session: &mut Session, msg: ClientWsMessage) -> Step {
  match msg {
    ClientWsMessage::Ping => Step::reply(ServerWsMessage::Pong),

    ClientWsMessage::ListProblems => Step::reply(ServerWsMessage::Problems {
      problems: list_problems(state, &ProblemQuery::default()),
    }),

    ClientWsMessage::SelectProblem { problem_id, confirmed } => {
      let Some(problem) = state.catalog.get(&problem_id) else {
        warn!(target: "session", %problem_id, "Unknown problem requested");
        return Step::reply(ServerWsMessage::Error { message: format!("Unknown problem: {problem_id}") });
      };
      let nav = session.select_problem(problem, |_| confirmed);
      info!(target: "session", %problem_id, ?nav, "select_problem");
      navigation_reply(state, session, nav)
    }

    ClientWsMessage::ReturnToCatalog { confirmed } => {
      let nav = session.return_to_catalog(|_| confirmed);
      info!(target: "session", ?nav, "return_to_catalog");
      navigation_reply(state, session, nav)
    }

    ClientWsMessage::Reset { confirmed } => {
      let nav = session.reset(|_| confirmed);
      info!(target: "session", ?nav, "reset");
      navigation_reply(state, session, nav)
    }

    ClientWsMessage::Edit { code } => {
      if !session.edit(code) {
        debug!(target: "session", phase = ?session.phase(), "edit ignored");
      }
      Step::reply(snapshot(session))
    }

    ClientWsMessage::Submit { code } => {
      if let Some(code) = code {
        session.edit(code);
      }
      let pending = session.begin_submit(&state.prompts);
      match &pending {
        Some(p) => info!(target: "session", problem_id = %p.ticket.problem_id(), code_len = session.code().len(), "submit accepted"),
        None => debug!(target: "session", phase = ?session.phase(), "submit ignored"),
      }
      Step { replies: vec![snapshot(session)], pending }
    }

    ClientWsMessage::Dismiss => {
      session.dismiss();
      Step::reply(snapshot(session))
    }

    ClientWsMessage::Hint => {
      let text = session
        .problem()
        .and_then(|p| hint_text(state, &p.id))
        .unwrap_or_else(|| state.messages.hint.clone());
      Step::reply(ServerWsMessage::Hint { text })
    }
  }
}

/// Run the evaluation for a pending review. Suitable for `tokio::spawn`.
pub async fn run_review(state: &AppState, request: &ReviewRequest) -> Result<ReviewResult, ConfigError> {
  match &state.reviewer {
    Ok(client) => client.evaluate(request).await,
    Err(e) => Err(e.clone()),
  }
}

/// Commit a finished review; returns nothing to send when the result is stale.
#[instrument(level = "info", skip(state, session, outcome), fields(problem_id = %ticket.problem_id()))]
pub fn finish_review(
  state: &AppState,
  session: &mut Session,
  ticket: &Ticket,
  outcome: Result<ReviewResult, ConfigError>,
) -> Vec<ServerWsMessage> {
  match session.complete(ticket, outcome, &state.messages.config_error) {
    Completion::Stale => {
      info!(target: "session", "Discarding stale review result");
      Vec::new()
    }
    Completion::Reviewed => {
      let result = session.result().cloned();
      info!(target: "session", score = ?result.as_ref().map(|r| r.score), "Review committed");
      let mut out: Vec<ServerWsMessage> = result.into_iter().map(|result| ServerWsMessage::Review { result }).collect();
      out.push(snapshot(session));
      out
    }
    Completion::Failed => {
      let message = session.error_message().unwrap_or_default().to_string();
      warn!(target: "session", %message, "Review failed (configuration)");
      vec![ServerWsMessage::Error { message }, snapshot(session)]
    }
  }
}

/// Catalog cards in catalog order, optionally filtered.
pub fn list_problems(state: &AppState, q: &ProblemQuery) -> Vec<ProblemSummary> {
  state
    .catalog
    .iter()
    .filter(|p| q.difficulty.map_or(true, |d| p.difficulty == d))
    .filter(|p| q.category.as_deref().map_or(true, |c| p.category.to_lowercase().contains(&c.to_lowercase())))
    .map(|p| to_summary(p))
    .collect()
}

/// Static study hint; `None` for an unknown problem.
pub fn hint_text(state: &AppState, problem_id: &str) -> Option<String> {
  state.catalog.get(problem_id).map(|_| state.messages.hint.clone())
}

#[derive(Debug, PartialEq)]
pub enum OneShotError {
  UnknownProblem(String),
  EmptySubmission,
  Config(ConfigError),
}

/// Stateless review for the HTTP API: same guards and failure policy as a session submit.
#[instrument(level = "info", skip(state, code), fields(%problem_id, code_len = code.len()))]
pub async fn one_shot_review(state: &AppState, problem_id: &str, code: &str) -> Result<ReviewResult, OneShotError> {
  let problem = state
    .catalog
    .get(problem_id)
    .ok_or_else(|| OneShotError::UnknownProblem(problem_id.to_string()))?;
  if is_blank(code) {
    return Err(OneShotError::EmptySubmission);
  }
  let request = build_review_request(&problem, code, &state.prompts);
  run_review(state, &request).await.map_err(OneShotError::Config)
}
