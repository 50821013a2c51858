use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the respondent submitting an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

/// Identifier wrapper for persisted evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(pub String);

impl EvaluationId {
    const PREFIX: &'static str = "eval-";

    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{sequence:06}", Self::PREFIX))
    }

    /// Numeric part of ids minted by [`EvaluationId::from_sequence`].
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }
}

/// Questionnaire item with its importance weight (always at least 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub weight: u32,
}

/// Respondent's answer on the 1 (least severe) to 5 (most severe) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: u8,
}

impl Answer {
    pub const MIN_VALUE: u8 = 1;
    pub const MAX_VALUE: u8 = 5;
    /// Values at or above this mark count toward the high-severity ratio.
    pub const HIGH_VALUE: u8 = 4;

    pub fn is_within_scale(&self) -> bool {
        (Self::MIN_VALUE..=Self::MAX_VALUE).contains(&self.value)
    }
}

/// Three-tier triage classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemaphoreState {
    Green,
    Yellow,
    Red,
}

impl SemaphoreState {
    pub const fn label(self) -> &'static str {
        match self {
            SemaphoreState::Green => "green",
            SemaphoreState::Yellow => "yellow",
            SemaphoreState::Red => "red",
        }
    }

    /// Case-insensitive lookup used when reading model replies.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "green" => Some(SemaphoreState::Green),
            "yellow" => Some(SemaphoreState::Yellow),
            "red" => Some(SemaphoreState::Red),
            _ => None,
        }
    }
}

impl fmt::Display for SemaphoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification produced for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub state: SemaphoreState,
    pub score: u8,
    pub observations: String,
    pub recommendations: [String; 3],
}

/// Which scoring path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringSource {
    Model,
    Fallback,
}

/// Answer as persisted next to its evaluation, with the weight applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub question_id: QuestionId,
    pub value: u8,
    pub weighted_score: u32,
}

/// Payload accepted from respondents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Append-only history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<ScoredAnswer>,
    pub result: EvaluationResult,
    pub source: ScoringSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
