use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weighted sum of a response's answers.
pub type Rating = i64;

/// Identifier wrapper for surveys. Assigned by the caller at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyId(pub u32);

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for a question within one survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for whoever submitted a response.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitterId(pub String);

impl SubmitterId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorted set of question ids, used to report key mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionKeys(pub BTreeSet<QuestionId>);

impl QuestionKeys {
    pub fn of<V>(map: &BTreeMap<QuestionId, V>) -> Self {
        Self(map.keys().copied().collect())
    }
}

impl fmt::Display for QuestionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, key) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}

/// Reasons a survey definition is rejected at creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("survey must define at least one question")]
    NoQuestions,
    #[error("question ids {questions} do not match weighted ids {weights}")]
    KeyMismatch {
        questions: QuestionKeys,
        weights: QuestionKeys,
    },
}

/// Reasons a submitted response is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseViolation {
    #[error("submitter id must not be blank")]
    BlankSubmitter,
    #[error("response must contain at least one answer")]
    NoAnswers,
    #[error("response must answer exactly the survey questions; expected {expected}, got {actual}")]
    KeyMismatch {
        expected: QuestionKeys,
        actual: QuestionKeys,
    },
    #[error("weighted rating exceeds the 64-bit range")]
    RatingOverflow,
}

/// Immutable survey definition: question text and integer weight per question.
///
/// Both maps always share the same non-empty key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveySchema {
    survey_id: SurveyId,
    questions: BTreeMap<QuestionId, String>,
    weights: BTreeMap<QuestionId, i32>,
}

impl SurveySchema {
    pub fn new(
        survey_id: SurveyId,
        questions: BTreeMap<QuestionId, String>,
        weights: BTreeMap<QuestionId, i32>,
    ) -> Result<Self, SchemaViolation> {
        if questions.is_empty() || weights.is_empty() {
            return Err(SchemaViolation::NoQuestions);
        }
        if !questions.keys().eq(weights.keys()) {
            return Err(SchemaViolation::KeyMismatch {
                questions: QuestionKeys::of(&questions),
                weights: QuestionKeys::of(&weights),
            });
        }

        Ok(Self {
            survey_id,
            questions,
            weights,
        })
    }

    pub fn survey_id(&self) -> SurveyId {
        self.survey_id
    }

    pub fn questions(&self) -> &BTreeMap<QuestionId, String> {
        &self.questions
    }

    pub fn weights(&self) -> &BTreeMap<QuestionId, i32> {
        &self.weights
    }

    pub fn weight(&self, question: QuestionId) -> Option<i32> {
        self.weights.get(&question).copied()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question_keys(&self) -> QuestionKeys {
        QuestionKeys::of(&self.questions)
    }
}

/// One submitter's answers to a survey, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyResponse {
    survey_id: SurveyId,
    submitter_id: SubmitterId,
    answers: BTreeMap<QuestionId, i32>,
    submitted_at: DateTime<Utc>,
}

impl SurveyResponse {
    pub fn new(
        survey_id: SurveyId,
        submitter_id: SubmitterId,
        answers: BTreeMap<QuestionId, i32>,
    ) -> Result<Self, ResponseViolation> {
        if submitter_id.is_blank() {
            return Err(ResponseViolation::BlankSubmitter);
        }
        if answers.is_empty() {
            return Err(ResponseViolation::NoAnswers);
        }

        Ok(Self {
            survey_id,
            submitter_id,
            answers,
            submitted_at: next_timestamp(),
        })
    }

    pub fn survey_id(&self) -> SurveyId {
        self.survey_id
    }

    pub fn submitter_id(&self) -> &SubmitterId {
        &self.submitter_id
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, i32> {
        &self.answers
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn answer_keys(&self) -> QuestionKeys {
        QuestionKeys::of(&self.answers)
    }
}

thread_local! {
    static LAST_TIMESTAMP: Cell<Option<DateTime<Utc>>> = const { Cell::new(None) };
}

/// Wall-clock timestamp clamped so it never goes backwards on the calling thread.
fn next_timestamp() -> DateTime<Utc> {
    LAST_TIMESTAMP.with(|last| {
        let now = Utc::now();
        let stamp = match last.get() {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        last.set(Some(stamp));
        stamp
    })
}
