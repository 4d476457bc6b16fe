use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{QuestionId, Rating, SubmitterId, SurveyId, SurveyResponse, SurveySchema};
use super::error::SurveyError;
use super::rating::rate;
use super::receipts::{DiscardReceipts, ReceiptPublisher, SubmissionReceipt};
use super::store::{InMemorySurveyStore, SurveyStore};

/// Service composing survey creation, rating, and aggregation behind one facade.
pub struct SurveyService<S, P> {
    store: Arc<S>,
    receipts: Arc<P>,
}

impl SurveyService<InMemorySurveyStore, DiscardReceipts> {
    /// Process-local service that keeps no submission receipts.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemorySurveyStore::new()),
            Arc::new(DiscardReceipts),
        )
    }
}

impl<S, P> SurveyService<S, P>
where
    S: SurveyStore + 'static,
    P: ReceiptPublisher + 'static,
{
    pub fn new(store: Arc<S>, receipts: Arc<P>) -> Self {
        Self { store, receipts }
    }

    /// Create a survey. An id can be created once; later attempts fail with `DuplicateSurvey`.
    pub fn create_survey(
        &self,
        survey_id: SurveyId,
        questions: BTreeMap<QuestionId, String>,
        weights: BTreeMap<QuestionId, i32>,
    ) -> Result<Arc<SurveySchema>, SurveyError> {
        if self.store.contains(survey_id) {
            return Err(SurveyError::DuplicateSurvey(survey_id));
        }

        let schema = SurveySchema::new(survey_id, questions, weights)
            .map_err(|reason| SurveyError::InvalidSchema { survey_id, reason })?;
        let schema = self.store.install(schema)?;

        info!(%survey_id, questions = schema.question_count(), "survey created");
        Ok(schema)
    }

    /// Rate a submission and fold it into the survey aggregate, returning its rating.
    pub fn submit_survey(
        &self,
        survey_id: SurveyId,
        submitter_id: SubmitterId,
        answers: BTreeMap<QuestionId, i32>,
    ) -> Result<Rating, SurveyError> {
        let schema = self.store.schema(survey_id)?;

        let rated = SurveyResponse::new(survey_id, submitter_id, answers)
            .and_then(|response| rate(&schema, &response).map(|rating| (response, rating)));
        let (response, rating) = match rated {
            Ok(rated) => rated,
            Err(reason) => {
                warn!(%survey_id, %reason, "submission rejected");
                return Err(SurveyError::InvalidResponse { survey_id, reason });
            }
        };

        let tally = self.store.fold(survey_id, rating)?;
        debug!(
            %survey_id,
            submitter = %response.submitter_id(),
            rating,
            submissions = tally.submissions,
            "submission folded"
        );

        let receipt = SubmissionReceipt {
            survey_id,
            submitter_id: response.submitter_id().clone(),
            rating,
            submitted_at: response.submitted_at(),
        };
        if let Err(error) = self.receipts.publish(receipt) {
            warn!(%survey_id, %error, "submission receipt not published");
        }

        Ok(rating)
    }

    pub fn average_rating(&self, survey_id: SurveyId) -> Result<f64, SurveyError> {
        self.store.average(survey_id)
    }

    pub fn submission_count(&self, survey_id: SurveyId) -> Result<u64, SurveyError> {
        self.store
            .snapshot(survey_id)
            .map(|snapshot| snapshot.submissions)
    }

    pub fn survey(&self, survey_id: SurveyId) -> Result<Arc<SurveySchema>, SurveyError> {
        self.store.schema(survey_id)
    }

    pub fn survey_exists(&self, survey_id: SurveyId) -> bool {
        self.store.contains(survey_id)
    }

    pub fn survey_ids(&self) -> Vec<SurveyId> {
        self.store.survey_ids()
    }

    /// Count and average taken from the same snapshot.
    pub fn summary(&self, survey_id: SurveyId) -> Result<SurveySummary, SurveyError> {
        let schema = self.store.schema(survey_id)?;
        let snapshot = self.store.snapshot(survey_id)?;
        Ok(SurveySummary {
            survey_id,
            question_count: schema.question_count(),
            submissions: snapshot.submissions,
            average_rating: snapshot.average(),
        })
    }
}

/// Read-only aggregate view for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    pub survey_id: SurveyId,
    pub question_count: usize,
    pub submissions: u64,
    pub average_rating: f64,
}
