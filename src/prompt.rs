//! Review request construction.
//!
//! Pure and deterministic: identical inputs always yield an identical request.

use serde::Serialize;

use crate::config::Prompts;
use crate::domain::ProblemRecord;
use crate::util::fill_template;

/// Everything the evaluation service needs for one review.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ReviewRequest {
  pub problem_id: String,
  pub title: String,
  pub language: String,
  pub reference_code: String,
  pub submitted_code: String,
  /// Instructional framing (role + output contract).
  pub system: String,
  /// Problem, reference, learner text and grading policy.
  pub user: String,
}

/// Build the request. Callers guard against empty submissions before calling.
pub fn build_review_request(problem: &ProblemRecord, submitted: &str, prompts: &Prompts) -> ReviewRequest {
  let system = fill_template(
    &prompts.review_system,
    &[("language", &problem.language), ("feedback_language", &prompts.feedback_language)],
  );
  let user = fill_template(
    &prompts.review_user_template,
    &[
      ("language", &problem.language),
      ("feedback_language", &prompts.feedback_language),
      ("title", &problem.title),
      ("reference_code", &problem.reference_code),
      ("user_code", submitted),
    ],
  );

  ReviewRequest {
    problem_id: problem.id.clone(),
    title: problem.title.clone(),
    language: problem.language.clone(),
    reference_code: problem.reference_code.clone(),
    submitted_code: submitted.to_string(),
    system,
    user,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::seed_problems;

  fn binary_search() -> ProblemRecord {
    seed_problems().into_iter().find(|p| p.id == "binary-search").unwrap()
  }

  #[test]
  fn request_carries_title_reference_and_submission() {
    let p = binary_search();
    let code = "def binary_search(nums, target):\n    return -1";
    let req = build_review_request(&p, code, &Prompts::default());

    assert_eq!(req.problem_id, "binary-search");
    assert!(req.user.contains(&p.title));
    assert!(req.user.contains(&p.reference_code));
    assert!(req.user.contains(code));
    assert!(req.system.contains("Python"));
    assert!(!req.user.contains("{reference_code}"));
  }

  #[test]
  fn request_states_the_grading_policy() {
    let req = build_review_request(&binary_search(), "x = 1", &Prompts::default());
    assert!(req.user.contains("MUST functionally match the reference"));
    assert!(req.user.contains("Structural fidelity"));
    assert!(req.user.contains("reduced (medium) score"));
    assert!(req.user.contains("Penalize typos"));
    assert!(req.user.contains("indentation"));
    assert!(req.user.contains("scores 0"));
    assert!(req.user.contains("written in Korean"));
  }

  #[test]
  fn build_is_deterministic() {
    let p = binary_search();
    let a = build_review_request(&p, "pass", &Prompts::default());
    let b = build_review_request(&p, "pass", &Prompts::default());
    assert_eq!(a, b);
  }

  #[test]
  fn placeholders_in_learner_text_are_not_expanded() {
    let p = binary_search();
    let req = build_review_request(&p, "print('{title}')", &Prompts::default());
    assert!(req.user.contains("print('{title}')"));
  }

  #[test]
  fn reference_with_placeholder_text_is_sent_verbatim() {
    let mut p = binary_search();
    p.reference_code = "def show(title):\n    return f\"{user_code} / {title}\"".into();
    let req = build_review_request(&p, "LEARNER_TEXT", &Prompts::default());

    assert!(req.user.contains(&p.reference_code));
    assert_eq!(req.user.matches("LEARNER_TEXT").count(), 1);
  }
}
