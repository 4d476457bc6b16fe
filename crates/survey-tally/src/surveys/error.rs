use super::domain::{ResponseViolation, SchemaViolation, SurveyId};

/// Failures surfaced by the survey registry. Every variant is a per-call validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurveyError {
    #[error("invalid survey {survey_id}: {reason}")]
    InvalidSchema {
        survey_id: SurveyId,
        reason: SchemaViolation,
    },
    #[error("survey {0} already exists")]
    DuplicateSurvey(SurveyId),
    #[error("survey {0} not found")]
    SurveyNotFound(SurveyId),
    #[error("invalid submission for survey {survey_id}: {reason}")]
    InvalidResponse {
        survey_id: SurveyId,
        reason: ResponseViolation,
    },
}

impl SurveyError {
    pub fn survey_id(&self) -> SurveyId {
        match self {
            SurveyError::InvalidSchema { survey_id, .. }
            | SurveyError::InvalidResponse { survey_id, .. } => *survey_id,
            SurveyError::DuplicateSurvey(survey_id) | SurveyError::SurveyNotFound(survey_id) => {
                *survey_id
            }
        }
    }
}
