//! Survey definitions, weighted rating, and concurrent per-survey aggregation.
//!
//! The [`SurveyService`] facade owns the creation and submission flow; everything it touches
//! is synchronous and bounded, so callers may drive it from any number of threads or from
//! async handlers without blocking on I/O.

pub mod domain;
pub mod error;
pub mod import;
pub mod rating;
pub mod receipts;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    QuestionId, QuestionKeys, Rating, ResponseViolation, SchemaViolation, SubmitterId, SurveyId,
    SurveyResponse, SurveySchema,
};
pub use error::SurveyError;
pub use import::{parse_submissions, read_submissions, ImportedSubmission, SubmissionImportError};
pub use rating::rate;
pub use receipts::{DiscardReceipts, ReceiptError, ReceiptPublisher, SubmissionReceipt};
pub use router::{survey_router, CreateSurveyRequest, SubmissionAccepted, SubmitSurveyRequest};
pub use service::{SurveyService, SurveySummary};
pub use store::{InMemorySurveyStore, SurveyStore, SurveyTally, TallySnapshot};
