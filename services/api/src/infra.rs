use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use survey_tally::surveys::{ReceiptError, ReceiptPublisher, SubmissionReceipt, SubmitterId};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) receipts: Arc<InMemoryReceiptLog>,
}

/// Keeps the most recent receipt per submitter for the submitter rating lookup.
#[derive(Default)]
pub(crate) struct InMemoryReceiptLog {
    latest: Mutex<HashMap<SubmitterId, SubmissionReceipt>>,
}

impl InMemoryReceiptLog {
    pub(crate) fn latest(&self, submitter_id: &SubmitterId) -> Option<SubmissionReceipt> {
        let guard = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(submitter_id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ReceiptPublisher for InMemoryReceiptLog {
    fn publish(&self, receipt: SubmissionReceipt) -> Result<(), ReceiptError> {
        let mut guard = self
            .latest
            .lock()
            .map_err(|_| ReceiptError::Unavailable("receipt log mutex poisoned".to_string()))?;
        guard.insert(receipt.submitter_id.clone(), receipt);
        Ok(())
    }
}
