//! Session state machine for one learner's submission attempt.
//!
//! The session is a plain owned value: every transition is synchronous and
//! pure apart from the confirmation capability passed into navigation calls.
//! The only asynchronous step (the review call) happens outside, between
//! `begin_submit` and `complete`, correlated by a `Ticket`.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Prompts;
use crate::domain::{ProblemRecord, ReviewResult};
use crate::error::ConfigError;
use crate::prompt::{build_review_request, ReviewRequest};
use crate::util::is_blank;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Analyzing,
  Reviewed,
  Error,
}

/// A `ReviewResult` exists only inside `Reviewed`.
#[derive(Clone, Debug, PartialEq)]
enum State {
  Idle,
  Analyzing(Ticket),
  Reviewed(ReviewResult),
  Error(String),
}

/// Identifies one in-flight review. A completion whose ticket does not match the
/// session's current attempt is stale and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
  epoch: u64,
  problem_id: String,
}

impl Ticket {
  pub fn problem_id(&self) -> &str { &self.problem_id }
}

/// What a navigation would destroy, handed to the confirmation capability.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmPrompt {
  SwitchProblem,
  ReturnToCatalog,
  Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
  Applied,
  /// Confirmation was requested and refused; nothing changed.
  Declined(ConfirmPrompt),
  /// Precondition not met (e.g. reset with no problem selected); nothing changed.
  Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
  Reviewed,
  Failed,
  Stale,
}

/// Returned by a successful `begin_submit`: run `request`, then call `complete(ticket, ..)`.
#[derive(Clone, Debug)]
pub struct PendingReview {
  pub ticket: Ticket,
  pub request: ReviewRequest,
}

#[derive(Debug)]
pub struct Session {
  problem: Option<Arc<ProblemRecord>>,
  code: String,
  state: State,
  epoch: u64,
}

impl Default for Session {
  fn default() -> Self { Self::new() }
}

impl Session {
  pub fn new() -> Self {
    Self { problem: None, code: String::new(), state: State::Idle, epoch: 0 }
  }

  pub fn phase(&self) -> Phase {
    match self.state {
      State::Idle => Phase::Idle,
      State::Analyzing(_) => Phase::Analyzing,
      State::Reviewed(_) => Phase::Reviewed,
      State::Error(_) => Phase::Error,
    }
  }

  pub fn problem(&self) -> Option<&Arc<ProblemRecord>> { self.problem.as_ref() }

  pub fn code(&self) -> &str { &self.code }

  pub fn result(&self) -> Option<&ReviewResult> {
    match &self.state {
      State::Reviewed(r) => Some(r),
      _ => None,
    }
  }

  pub fn error_message(&self) -> Option<&str> {
    match &self.state {
      State::Error(m) => Some(m),
      _ => None,
    }
  }

  pub fn can_submit(&self) -> bool {
    self.problem.is_some() && !is_blank(&self.code) && self.phase() != Phase::Analyzing
  }

  /// Edits that a navigation would silently throw away.
  pub fn has_unsynced_edits(&self) -> bool {
    match &self.problem {
      Some(p) => self.code != p.boilerplate && !is_blank(&self.code) && self.phase() != Phase::Reviewed,
      None => false,
    }
  }

  fn confirmed(&self, prompt: ConfirmPrompt, confirm: impl FnOnce(ConfirmPrompt) -> bool) -> bool {
    !self.has_unsynced_edits() || confirm(prompt)
  }

  /// Start over on `problem`: boilerplate text, `Idle`, no result. Any in-flight review becomes stale.
  pub fn select_problem(
    &mut self,
    problem: Arc<ProblemRecord>,
    confirm: impl FnOnce(ConfirmPrompt) -> bool,
  ) -> Navigation {
    if !self.confirmed(ConfirmPrompt::SwitchProblem, confirm) {
      return Navigation::Declined(ConfirmPrompt::SwitchProblem);
    }
    self.code = problem.boilerplate.clone();
    self.problem = Some(problem);
    self.restart();
    Navigation::Applied
  }

  /// Leave the workspace: no selected problem, empty editor.
  pub fn return_to_catalog(&mut self, confirm: impl FnOnce(ConfirmPrompt) -> bool) -> Navigation {
    if !self.confirmed(ConfirmPrompt::ReturnToCatalog, confirm) {
      return Navigation::Declined(ConfirmPrompt::ReturnToCatalog);
    }
    self.problem = None;
    self.code.clear();
    self.restart();
    Navigation::Applied
  }

  /// Restore the current problem's boilerplate. Only valid with a problem selected.
  pub fn reset(&mut self, confirm: impl FnOnce(ConfirmPrompt) -> bool) -> Navigation {
    let Some(problem) = self.problem.clone() else { return Navigation::Ignored };
    if !self.confirmed(ConfirmPrompt::Reset, confirm) {
      return Navigation::Declined(ConfirmPrompt::Reset);
    }
    self.code = problem.boilerplate.clone();
    self.restart();
    Navigation::Applied
  }

  /// Replace the editor text. The editor is read-only while analyzing.
  pub fn edit(&mut self, code: impl Into<String>) -> bool {
    if self.problem.is_none() || self.phase() == Phase::Analyzing {
      return false;
    }
    self.code = code.into();
    true
  }

  /// Guarded submit. `None` means nothing happened.
  pub fn begin_submit(&mut self, prompts: &Prompts) -> Option<PendingReview> {
    if !self.can_submit() {
      return None;
    }
    let problem = self.problem.as_ref()?;
    let request = build_review_request(problem, &self.code, prompts);
    self.epoch += 1;
    let ticket = Ticket { epoch: self.epoch, problem_id: problem.id.clone() };
    self.state = State::Analyzing(ticket.clone());
    Some(PendingReview { ticket, request })
  }

  /// Commit a finished review if it still belongs to the active attempt.
  /// `Err` carries a configuration failure and moves the session to `Error`.
  pub fn complete(&mut self, ticket: &Ticket, outcome: Result<ReviewResult, ConfigError>, error_text: &str) -> Completion {
    let current = matches!(&self.state, State::Analyzing(t) if t == ticket);
    if !current {
      return Completion::Stale;
    }
    match outcome {
      Ok(result) => {
        self.state = State::Reviewed(result);
        Completion::Reviewed
      }
      Err(e) => {
        self.state = State::Error(format!("{error_text} ({e})"));
        Completion::Failed
      }
    }
  }

  /// Close the result panel. Text is kept.
  pub fn dismiss(&mut self) -> bool {
    match self.state {
      State::Reviewed(_) | State::Error(_) => {
        self.state = State::Idle;
        true
      }
      _ => false,
    }
  }

  fn restart(&mut self) {
    self.epoch += 1;
    self.state = State::Idle;
  }

  pub fn snapshot(&self) -> SessionOut {
    SessionOut {
      problem_id: self.problem.as_ref().map(|p| p.id.clone()),
      phase: self.phase(),
      code: self.code.clone(),
      can_submit: self.can_submit(),
      result: self.result().cloned(),
      error: self.error_message().map(str::to_string),
    }
  }
}

/// Session view sent to the presentation layer.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
  pub problem_id: Option<String>,
  pub phase: Phase,
  pub code: String,
  pub can_submit: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ReviewResult>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}
