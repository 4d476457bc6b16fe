use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::surveys::domain::{QuestionId, SurveyId};
use crate::surveys::receipts::{ReceiptError, ReceiptPublisher, SubmissionReceipt};
use crate::surveys::store::InMemorySurveyStore;
use crate::surveys::{survey_router, SurveyService};

pub(super) const SAMPLE_SURVEY: SurveyId = SurveyId(1);

pub(super) fn sample_questions() -> BTreeMap<QuestionId, String> {
    BTreeMap::from([
        (QuestionId(1), "Q1".to_string()),
        (QuestionId(2), "Q2".to_string()),
        (QuestionId(3), "Q3".to_string()),
    ])
}

pub(super) fn sample_weights() -> BTreeMap<QuestionId, i32> {
    BTreeMap::from([(QuestionId(1), 2), (QuestionId(2), 4), (QuestionId(3), 5)])
}

pub(super) fn answers(values: &[(u32, i32)]) -> BTreeMap<QuestionId, i32> {
    values
        .iter()
        .map(|(question, answer)| (QuestionId(*question), *answer))
        .collect()
}

pub(super) type TestService = SurveyService<InMemorySurveyStore, MemoryReceipts>;

pub(super) fn build_service() -> (TestService, Arc<MemoryReceipts>) {
    let receipts = Arc::new(MemoryReceipts::default());
    let service = SurveyService::new(Arc::new(InMemorySurveyStore::new()), receipts.clone());
    (service, receipts)
}

pub(super) fn seeded_service() -> (TestService, Arc<MemoryReceipts>) {
    let (service, receipts) = build_service();
    service
        .create_survey(SAMPLE_SURVEY, sample_questions(), sample_weights())
        .expect("sample survey is valid");
    (service, receipts)
}

#[derive(Default)]
pub(super) struct MemoryReceipts {
    events: Mutex<Vec<SubmissionReceipt>>,
}

impl MemoryReceipts {
    pub(super) fn events(&self) -> Vec<SubmissionReceipt> {
        self.events.lock().expect("receipt mutex poisoned").clone()
    }
}

impl ReceiptPublisher for MemoryReceipts {
    fn publish(&self, receipt: SubmissionReceipt) -> Result<(), ReceiptError> {
        self.events
            .lock()
            .expect("receipt mutex poisoned")
            .push(receipt);
        Ok(())
    }
}

pub(super) struct OfflineReceipts;

impl ReceiptPublisher for OfflineReceipts {
    fn publish(&self, _receipt: SubmissionReceipt) -> Result<(), ReceiptError> {
        Err(ReceiptError::Unavailable("audit log offline".to_string()))
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    survey_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
