//! Domain models: problem records, difficulty levels, and review results.

use serde::{Deserialize, Serialize};

/// Fixed, ordered difficulty scale shown on catalog cards.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

fn default_language() -> String { "Python".into() }

/// One clone-coding exercise. Loaded once at startup and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
  pub id: String,
  pub title: String,
  pub category: String,
  pub difficulty: Difficulty,
  pub description: String,
  /// Source notation of the reference (drives the formatting conventions the grader checks).
  #[serde(default = "default_language")]
  pub language: String,
  pub reference_code: String,
  pub boilerplate: String,
  /// Rendered "input => expected" strings. Displayed only, never executed.
  #[serde(default)]
  pub test_cases: Vec<String>,
}

/// Outcome of one evaluation call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
  pub is_correct: bool,
  pub score: u8,
  pub time_complexity: String,
  pub space_complexity: String,
  pub feedback: String,
  pub improved_code: String,
}

impl ReviewResult {
  pub const UNKNOWN_COMPLEXITY: &'static str = "Unknown";

  /// Synthesized result used in place of a genuine evaluation when the remote call fails.
  pub fn fallback(reference_code: &str, feedback: &str) -> Self {
    Self {
      is_correct: false,
      score: 0,
      time_complexity: Self::UNKNOWN_COMPLEXITY.into(),
      space_complexity: Self::UNKNOWN_COMPLEXITY.into(),
      feedback: feedback.into(),
      improved_code: reference_code.into(),
    }
  }
}

/// Clamp any numeric score the grader returns into `0..=100`.
pub fn clamp_score(raw: f64) -> u8 {
  if raw.is_nan() { return 0; }
  raw.round().clamp(0.0, 100.0) as u8
}
