use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Rating, SubmitterId, SurveyId};

/// Record of one folded submission, handed to whoever retains submission history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub survey_id: SurveyId,
    pub submitter_id: SubmitterId,
    pub rating: Rating,
    pub submitted_at: DateTime<Utc>,
}

/// Trait describing outbound receipt hooks (audit logs, per-submitter views).
pub trait ReceiptPublisher: Send + Sync {
    fn publish(&self, receipt: SubmissionReceipt) -> Result<(), ReceiptError>;
}

/// Receipt dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("receipt sink unavailable: {0}")]
    Unavailable(String),
}

/// Publisher for callers that do not retain receipts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardReceipts;

impl ReceiptPublisher for DiscardReceipts {
    fn publish(&self, _receipt: SubmissionReceipt) -> Result<(), ReceiptError> {
        Ok(())
    }
}
