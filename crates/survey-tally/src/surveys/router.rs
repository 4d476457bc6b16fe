use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{QuestionId, Rating, SubmitterId, SurveyId};
use super::error::SurveyError;
use super::receipts::ReceiptPublisher;
use super::service::SurveyService;
use super::store::SurveyStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSurveyRequest {
    pub survey_id: SurveyId,
    pub questions: BTreeMap<QuestionId, String>,
    pub weights: BTreeMap<QuestionId, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSurveyRequest {
    pub submitter_id: SubmitterId,
    pub answers: BTreeMap<QuestionId, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAccepted {
    pub survey_id: SurveyId,
    pub rating: Rating,
}

/// Router builder exposing survey creation, submission, and aggregate reads.
pub fn survey_router<S, P>(service: Arc<SurveyService<S, P>>) -> Router
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/surveys",
            post(create_handler::<S, P>).get(list_handler::<S, P>),
        )
        .route("/api/v1/surveys/:survey_id", get(schema_handler::<S, P>))
        .route(
            "/api/v1/surveys/:survey_id/submissions",
            post(submit_handler::<S, P>),
        )
        .route(
            "/api/v1/surveys/:survey_id/summary",
            get(summary_handler::<S, P>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, P>(
    State(service): State<Arc<SurveyService<S, P>>>,
    axum::Json(request): axum::Json<CreateSurveyRequest>,
) -> Response
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    let CreateSurveyRequest {
        survey_id,
        questions,
        weights,
    } = request;

    match service.create_survey(survey_id, questions, weights) {
        Ok(schema) => (StatusCode::CREATED, axum::Json(schema.as_ref())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S, P>(State(service): State<Arc<SurveyService<S, P>>>) -> Response
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    let payload = json!({ "survey_ids": service.survey_ids() });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn schema_handler<S, P>(
    State(service): State<Arc<SurveyService<S, P>>>,
    Path(survey_id): Path<u32>,
) -> Response
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    match service.survey(SurveyId(survey_id)) {
        Ok(schema) => (StatusCode::OK, axum::Json(schema.as_ref())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, P>(
    State(service): State<Arc<SurveyService<S, P>>>,
    Path(survey_id): Path<u32>,
    axum::Json(request): axum::Json<SubmitSurveyRequest>,
) -> Response
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    let survey_id = SurveyId(survey_id);
    match service.submit_survey(survey_id, request.submitter_id, request.answers) {
        Ok(rating) => {
            let body = SubmissionAccepted { survey_id, rating };
            (StatusCode::ACCEPTED, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<S, P>(
    State(service): State<Arc<SurveyService<S, P>>>,
    Path(survey_id): Path<u32>,
) -> Response
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    match service.summary(SurveyId(survey_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &SurveyError) -> StatusCode {
    match error {
        SurveyError::SurveyNotFound(_) => StatusCode::NOT_FOUND,
        SurveyError::DuplicateSurvey(_) => StatusCode::CONFLICT,
        SurveyError::InvalidSchema { .. } | SurveyError::InvalidResponse { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn error_response(error: SurveyError) -> Response {
    let payload = json!({
        "survey_id": error.survey_id(),
        "error": error.to_string(),
    });
    (status_for(&error), axum::Json(payload)).into_response()
}
