//! Per-survey rating aggregates.
//!
//! Each survey owns one [`SurveyTally`] whose submission count and running total live behind a
//! single mutex, so a fold updates both fields as one step and a snapshot can never pair the
//! count from one fold with the total from another. The registry map is only write-locked while
//! a survey is installed; folds and snapshots take its read lock just long enough to clone the
//! slot handle, so contention on one survey never serialises work on another.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;

use super::domain::{Rating, SurveyId, SurveySchema};
use super::error::SurveyError;

/// Consistent `(count, total)` pair observed at a single instant.
///
/// `total` is 128-bit: with a 64-bit count and 64-bit ratings it cannot overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    pub submissions: u64,
    pub total: i128,
}

impl TallySnapshot {
    /// Mean rating, defined as `0.0` before the first submission.
    pub fn average(&self) -> f64 {
        if self.submissions == 0 {
            0.0
        } else {
            self.total as f64 / self.submissions as f64
        }
    }

    fn folded(self, rating: Rating) -> Self {
        Self {
            submissions: self.submissions + 1,
            total: self.total + i128::from(rating),
        }
    }
}

/// Exclusive aggregation unit for one survey.
#[derive(Debug, Default)]
pub struct SurveyTally {
    state: Mutex<TallySnapshot>,
}

impl SurveyTally {
    /// Apply one rating and return the state immediately after it.
    pub fn fold(&self, rating: Rating) -> TallySnapshot {
        // The pair is replaced in one assignment, so a poisoned guard still holds a whole state.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = state.folded(rating);
        *state = next;
        next
    }

    pub fn snapshot(&self) -> TallySnapshot {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Schema and aggregate installed together for one survey id.
#[derive(Debug)]
struct SurveySlot {
    schema: Arc<SurveySchema>,
    tally: SurveyTally,
}

/// Storage abstraction so the service can be exercised against alternative backends.
pub trait SurveyStore: Send + Sync {
    /// Install a schema with a zeroed aggregate. Exactly one concurrent install per id wins.
    fn install(&self, schema: SurveySchema) -> Result<Arc<SurveySchema>, SurveyError>;
    fn schema(&self, survey_id: SurveyId) -> Result<Arc<SurveySchema>, SurveyError>;
    fn fold(&self, survey_id: SurveyId, rating: Rating) -> Result<TallySnapshot, SurveyError>;
    fn snapshot(&self, survey_id: SurveyId) -> Result<TallySnapshot, SurveyError>;
    fn contains(&self, survey_id: SurveyId) -> bool;
    fn survey_ids(&self) -> Vec<SurveyId>;

    fn average(&self, survey_id: SurveyId) -> Result<f64, SurveyError> {
        self.snapshot(survey_id).map(|snapshot| snapshot.average())
    }
}

/// Process-lifetime store keyed by survey id.
#[derive(Debug, Default)]
pub struct InMemorySurveyStore {
    slots: RwLock<HashMap<SurveyId, Arc<SurveySlot>>>,
}

impl InMemorySurveyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, survey_id: SurveyId) -> Result<Arc<SurveySlot>, SurveyError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&survey_id)
            .cloned()
            .ok_or(SurveyError::SurveyNotFound(survey_id))
    }
}

impl SurveyStore for InMemorySurveyStore {
    fn install(&self, schema: SurveySchema) -> Result<Arc<SurveySchema>, SurveyError> {
        let survey_id = schema.survey_id();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots.entry(survey_id) {
            Entry::Occupied(_) => Err(SurveyError::DuplicateSurvey(survey_id)),
            Entry::Vacant(vacant) => {
                let schema = Arc::new(schema);
                vacant.insert(Arc::new(SurveySlot {
                    schema: schema.clone(),
                    tally: SurveyTally::default(),
                }));
                Ok(schema)
            }
        }
    }

    fn schema(&self, survey_id: SurveyId) -> Result<Arc<SurveySchema>, SurveyError> {
        self.slot(survey_id).map(|slot| slot.schema.clone())
    }

    fn fold(&self, survey_id: SurveyId, rating: Rating) -> Result<TallySnapshot, SurveyError> {
        Ok(self.slot(survey_id)?.tally.fold(rating))
    }

    fn snapshot(&self, survey_id: SurveyId) -> Result<TallySnapshot, SurveyError> {
        Ok(self.slot(survey_id)?.tally.snapshot())
    }

    fn contains(&self, survey_id: SurveyId) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&survey_id)
    }

    fn survey_ids(&self) -> Vec<SurveyId> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<SurveyId> = slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
