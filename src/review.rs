//! Review client: sends a `ReviewRequest` to the remote evaluation service and
//! turns the reply into a validated `ReviewResult`.
//!
//! The production backend speaks the OpenAI-compatible chat.completions API with a
//! strict JSON schema. Calls are instrumented and log model names, latencies and
//! response sizes (not contents). The API key is never logged.
//!
//! Failure policy: any transport, status, timeout or validation failure resolves to
//! the fallback result. Only a missing credential is returned as an error.

use std::{sync::Arc, time::{Duration, Instant}};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::config::ReviewSettings;
use crate::domain::{clamp_score, ReviewResult};
use crate::error::{ConfigError, ReviewError};
use crate::prompt::ReviewRequest;
use crate::util::{strip_code_fence, trunc_for_log};

/// Field names the evaluation service must return, all mandatory.
pub const REQUIRED_FIELDS: [&str; 6] =
  ["isCorrect", "score", "timeComplexity", "spaceComplexity", "feedback", "improvedCode"];

/// "Text in, structured text out". Any service honoring the six-field contract fits here.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
  /// Returns the raw reply body; validation happens in `ReviewClient`.
  async fn complete(&self, api_key: &str, request: &ReviewRequest) -> Result<String, ReviewError>;
}

/// Where the access credential comes from. Resolved on every call.
#[derive(Clone, Debug)]
pub enum Credential {
  Env(String),
  #[cfg(test)]
  Fixed(String),
}

impl Credential {
  pub fn resolve(&self) -> Result<String, ConfigError> {
    let (value, var) = match self {
      Credential::Env(var) => (std::env::var(var).ok(), var.as_str()),
      #[cfg(test)]
      Credential::Fixed(v) => (Some(v.clone()), "<fixed>"),
    };
    value
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| ConfigError::MissingCredential { var: var.to_string() })
  }
}

#[derive(Clone)]
pub struct ReviewClient {
  backend: Arc<dyn ReviewBackend>,
  credential: Credential,
  timeout: Duration,
  fallback_feedback: String,
}

impl ReviewClient {
  pub fn new(
    backend: Arc<dyn ReviewBackend>,
    credential: Credential,
    timeout: Duration,
    fallback_feedback: impl Into<String>,
  ) -> Self {
    Self { backend, credential, timeout, fallback_feedback: fallback_feedback.into() }
  }

  /// Evaluate one submission. Never fails for runtime reasons; see module docs.
  #[instrument(level = "info", skip(self, request),
               fields(problem = %request.problem_id, code_len = request.submitted_code.len()))]
  pub async fn evaluate(&self, request: &ReviewRequest) -> Result<ReviewResult, ConfigError> {
    let api_key = self.credential.resolve()?;

    let start = Instant::now();
    let outcome = match tokio::time::timeout(self.timeout, self.backend.complete(&api_key, request)).await {
      Ok(Ok(body)) => parse_review(&body),
      Ok(Err(e)) => Err(e),
      Err(_) => Err(ReviewError::Timeout(self.timeout)),
    };
    let elapsed = start.elapsed();

    match outcome {
      Ok(result) => {
        info!(?elapsed, score = result.score, is_correct = result.is_correct, "Review received");
        Ok(result)
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Review failed; using fallback result");
        Ok(ReviewResult::fallback(&request.reference_code, &self.fallback_feedback))
      }
    }
  }
}

/// Validate the opaque reply against the six-field schema.
pub fn parse_review(body: &str) -> Result<ReviewResult, ReviewError> {
  #[derive(Deserialize)]
  #[serde(rename_all = "camelCase")]
  struct Raw {
    is_correct: bool,
    score: f64,
    time_complexity: String,
    space_complexity: String,
    feedback: String,
    improved_code: String,
  }

  let text = strip_code_fence(body);
  if text.is_empty() {
    return Err(ReviewError::EmptyBody);
  }
  let value: Value = serde_json::from_str(text)?;
  for field in REQUIRED_FIELDS {
    if value.get(field).is_none() {
      return Err(ReviewError::MissingField(field));
    }
  }
  let raw: Raw = serde_json::from_value(value)?;
  Ok(ReviewResult {
    is_correct: raw.is_correct,
    score: clamp_score(raw.score),
    time_complexity: raw.time_complexity,
    space_complexity: raw.space_complexity,
    feedback: raw.feedback,
    improved_code: raw.improved_code,
  })
}

/// JSON schema sent as the structured-output contract.
pub fn review_schema() -> Value {
  json!({
    "type": "object",
    "properties": {
      "isCorrect": {
        "type": "boolean",
        "description": "Whether the code functionally works AND closely follows the reference implementation structure."
      },
      "score": {
        "type": "integer",
        "description": "0 to 100. 100 means a perfect clone (logic and structure). Deduct for logic errors, typos, indentation errors, or deviation from the reference pattern."
      },
      "timeComplexity": { "type": "string", "description": "Time complexity of the learner's code." },
      "spaceComplexity": { "type": "string", "description": "Space complexity of the learner's code." },
      "feedback": { "type": "string", "description": "Tutor feedback on accuracy, missed logic and formatting." },
      "improvedCode": { "type": "string", "description": "The learner's code corrected to match the reference implementation." }
    },
    "required": REQUIRED_FIELDS,
    "additionalProperties": false
  })
}

/// OpenAI-compatible backend.
#[derive(Clone)]
pub struct OpenAiBackend {
  pub client: reqwest::Client,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
}

impl OpenAiBackend {
  pub fn new(settings: &ReviewSettings) -> Result<Self, ConfigError> {
    // Transport-level cap slightly above the client's bounded wait.
    let client = reqwest::Client::builder()
      .timeout(settings.timeout + Duration::from_secs(5))
      .build()
      .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
    Ok(Self {
      client,
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      model: settings.model.clone(),
      temperature: settings.temperature,
    })
  }
}

#[async_trait]
impl ReviewBackend for OpenAiBackend {
  #[instrument(level = "info", skip(self, api_key, request), fields(model = %self.model))]
  async fn complete(&self, api_key: &str, request: &ReviewRequest) -> Result<String, ReviewError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: request.system.clone() },
        ChatMessageReq { role: "user".into(), content: request.user.clone() },
      ],
      temperature: self.temperature,
      response_format: ResponseFormat {
        r#type: "json_schema".into(),
        json_schema: JsonSchemaSpec { name: "code_review".into(), strict: true, schema: review_schema() },
      },
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "algoclone-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(ReviewError::Status { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Evaluation usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();
    if text.trim().is_empty() {
      warn!("Evaluation service returned no content");
      return Err(ReviewError::EmptyBody);
    }
    info!(reply_len = text.len(), "Evaluation reply received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  response_format: ResponseFormat,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")] r#type: String,
  json_schema: JsonSchemaSpec,
}
#[derive(Serialize)]
struct JsonSchemaSpec { name: String, strict: bool, schema: Value }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
