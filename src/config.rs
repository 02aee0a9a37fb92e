//! Configuration: TOML agent config (prompts, messages, problem bank) plus
//! environment-driven review settings.
//!
//! See `AgentConfig`, `Prompts`, `Messages` and `ReviewSettings` for the expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Difficulty;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub messages: Messages,
  #[serde(default)]
  pub problems: Vec<ProblemCfg>,
}

/// Problem entry accepted in TOML configuration.
/// An entry whose `id` matches a built-in problem replaces it in place.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemCfg {
  pub id: String,
  pub title: String,
  #[serde(default)] pub category: Option<String>,
  #[serde(default)] pub difficulty: Option<Difficulty>,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub language: Option<String>,
  #[serde(default)] pub reference_code: Option<String>,
  #[serde(default)] pub boilerplate: Option<String>,
  #[serde(default)] pub test_cases: Vec<String>,
}

/// Prompts used to frame a review request. Defaults encode the grading policy.
/// Placeholders: `{language}`, `{feedback_language}`, `{title}`, `{reference_code}`, `{user_code}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub review_system: String,
  pub review_user_template: String,
  pub feedback_language: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      review_system: "You are a strict but helpful {language} clone coding tutor. \
The learner is practicing by typing out a reference implementation of a standard algorithm. \
Respond ONLY with a JSON object matching the requested schema.".into(),
      review_user_template: "Target problem: {title}\n\n\
REFERENCE CODE (the learner is supposed to clone this):\n{reference_code}\n\n\
LEARNER'S TYPED CODE:\n{user_code}\n\n\
GRADING POLICY:\n\
- The logic MUST functionally match the reference.\n\
- Structural fidelity to the reference is weighted: a logically correct submission that takes a materially different approach gets a reduced (medium) score, and the feedback must explain the deviation and ask the learner to follow the reference pattern.\n\
- Penalize typos and any indentation or formatting that departs from {language} conventions as used in the reference (naming style, indentation width, type hints).\n\
- An empty or entirely incorrect submission scores 0.\n\
- A faithful clone scores high. Comments are optional.\n\n\
OUTPUT:\n\
- isCorrect: true only if the code works AND closely follows the reference structure.\n\
- score: integer 0-100 (100 = perfect clone of logic and structure).\n\
- timeComplexity / spaceComplexity: of the learner's code, e.g. \"O(n)\".\n\
- feedback: written in {feedback_language}; did they type it correctly, did they miss logic, praise accuracy.\n\
- improvedCode: the learner's code corrected to match the reference.".into(),
      feedback_language: "Korean".into(),
    }
  }
}

/// User-facing strings. Defaults are the product's Korean copy.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  pub review_failed: String,
  pub config_error: String,
  pub confirm_switch_problem: String,
  pub confirm_return_to_catalog: String,
  pub confirm_reset: String,
  pub hint: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      review_failed: "AI 분석 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".into(),
      config_error: "평가 서비스가 설정되지 않았습니다. 관리자에게 문의하세요.".into(),
      confirm_switch_problem: "작성 중인 코드가 초기화됩니다. 다른 문제로 이동하시겠습니까?".into(),
      confirm_return_to_catalog: "작성 중인 코드가 저장되지 않았습니다. 메뉴로 돌아가시겠습니까?".into(),
      confirm_reset: "작성한 코드를 초기화 하시겠습니까?".into(),
      hint: "참조 코드를 자세히 읽고 흐름을 파악해보세요.".into(),
    }
  }
}

/// Remote evaluation settings, read from the environment at startup.
/// The credential itself is NOT stored here; it is read at call time from `api_key_env`.
#[derive(Clone, Debug)]
pub struct ReviewSettings {
  pub base_url: String,
  pub model: String,
  pub api_key_env: String,
  pub timeout: Duration,
  pub temperature: f32,
}

impl Default for ReviewSettings {
  fn default() -> Self {
    Self {
      base_url: "https://api.openai.com/v1".into(),
      model: "gpt-4o-mini".into(),
      api_key_env: "OPENAI_API_KEY".into(),
      timeout: Duration::from_secs(30),
      temperature: 0.1,
    }
  }
}

impl ReviewSettings {
  pub fn from_env() -> Self {
    let d = Self::default();
    Self {
      base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(d.base_url),
      model: std::env::var("OPENAI_REVIEW_MODEL").unwrap_or(d.model),
      api_key_env: std::env::var("REVIEW_API_KEY_ENV").unwrap_or(d.api_key_env),
      timeout: std::env::var("REVIEW_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(d.timeout),
      temperature: std::env::var("REVIEW_TEMPERATURE")
        .ok()
        .and_then(|v| parse_temperature(&v))
        .unwrap_or(d.temperature),
    }
  }
}

/// Sampling temperature within `0.0..=2.0`; `nan`/`inf` are rejected.
fn parse_temperature(raw: &str) -> Option<f32> {
  raw.trim().parse::<f32>().ok().filter(|t| t.is_finite()).map(|t| t.clamp(0.0, 2.0))
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "algoclone", %path, problems = cfg.problems.len(), "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "algoclone", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      warn!(target: "algoclone", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}
