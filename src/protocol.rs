//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, ProblemRecord, ReviewResult};
use crate::session::{ConfirmPrompt, SessionOut};

/// Messages the client can send over WebSocket.
/// `confirmed` answers a previous `confirm_required`; omitted means "not confirmed".
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListProblems,
    SelectProblem {
        #[serde(rename = "problemId")]
        problem_id: String,
        #[serde(default)]
        confirmed: bool,
    },
    Edit {
        code: String,
    },
    Submit {
        #[serde(default)]
        code: Option<String>,
    },
    Reset {
        #[serde(default)]
        confirmed: bool,
    },
    Dismiss,
    ReturnToCatalog {
        #[serde(default)]
        confirmed: bool,
    },
    Hint,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Problems {
        problems: Vec<ProblemSummary>,
    },
    Session {
        session: SessionOut,
    },
    ConfirmRequired {
        action: ConfirmPrompt,
        message: String,
    },
    Review {
        result: ReviewResult,
    },
    Hint {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Catalog card.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub description: String,
}

pub fn to_summary(p: &ProblemRecord) -> ProblemSummary {
    ProblemSummary {
        id: p.id.clone(),
        title: p.title.clone(),
        category: p.category.clone(),
        difficulty: p.difficulty,
        description: p.description.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Default, Deserialize)]
pub struct ProblemQuery {
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HintQuery {
    #[serde(rename = "problemId")]
    pub problem_id: String,
}
#[derive(Serialize)]
pub struct HintOut {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ReviewIn {
    #[serde(rename = "problemId")]
    pub problem_id: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
