use super::common::*;
use crate::surveys::domain::{SurveyId, SurveySchema};
use crate::surveys::error::SurveyError;
use crate::surveys::store::{InMemorySurveyStore, SurveyStore, SurveyTally, TallySnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;

fn sample_schema(survey_id: SurveyId) -> SurveySchema {
    SurveySchema::new(survey_id, sample_questions(), sample_weights()).expect("valid schema")
}

#[test]
fn fresh_tally_averages_to_zero() {
    let tally = SurveyTally::default();
    assert_eq!(tally.snapshot(), TallySnapshot::default());
    assert_eq!(tally.snapshot().average(), 0.0);
}

#[test]
fn fold_returns_state_including_the_rating() {
    let tally = SurveyTally::default();
    assert_eq!(
        tally.fold(36),
        TallySnapshot {
            submissions: 1,
            total: 36
        }
    );
    let after = tally.fold(110);
    assert_eq!(after.submissions, 2);
    assert_eq!(after.total, 146);
    assert_eq!(after.average(), 73.0);
}

#[test]
fn total_grows_past_64_bits_without_wrapping() {
    let tally = SurveyTally::default();
    for _ in 0..4 {
        tally.fold(i64::MAX);
    }
    let snapshot = tally.snapshot();
    assert_eq!(snapshot.total, 4 * i128::from(i64::MAX));
    assert_eq!(snapshot.submissions, 4);
}

#[test]
fn unknown_survey_fails_every_operation() {
    let store = InMemorySurveyStore::new();
    let missing = SurveyId(42);
    assert_eq!(store.fold(missing, 1), Err(SurveyError::SurveyNotFound(missing)));
    assert_eq!(store.snapshot(missing), Err(SurveyError::SurveyNotFound(missing)));
    assert_eq!(store.average(missing), Err(SurveyError::SurveyNotFound(missing)));
    assert!(store.schema(missing).is_err());
    assert!(!store.contains(missing));
}

#[test]
fn install_is_one_shot_per_id() {
    let store = InMemorySurveyStore::new();
    store.install(sample_schema(SAMPLE_SURVEY)).expect("first install");
    assert_eq!(
        store.install(sample_schema(SAMPLE_SURVEY)).map(|_| ()),
        Err(SurveyError::DuplicateSurvey(SAMPLE_SURVEY))
    );
    assert_eq!(store.snapshot(SAMPLE_SURVEY), Ok(TallySnapshot::default()));
}

#[test]
fn racing_installs_admit_exactly_one_winner() {
    let store = InMemorySurveyStore::new();
    let contenders = 16;
    let barrier = Barrier::new(contenders);

    let (store, barrier) = (&store, &barrier);
    let wins = thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    store.install(sample_schema(SurveyId(7))).is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("installer thread panicked"))
            .filter(|won| *won)
            .count()
    });

    assert_eq!(wins, 1);
    assert_eq!(store.survey_ids(), vec![SurveyId(7)]);
}

#[test]
fn concurrent_folds_lose_no_updates() {
    let store = InMemorySurveyStore::new();
    store.install(sample_schema(SAMPLE_SURVEY)).expect("install");
    let threads = 8;
    let per_thread = 2_000;
    let barrier = Barrier::new(threads);

    thread::scope(|scope| {
        for worker in 0..threads {
            let store = &store;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                for step in 0..per_thread {
                    let rating = (worker * per_thread + step) as i64;
                    store.fold(SAMPLE_SURVEY, rating).expect("survey exists");
                }
            });
        }
    });

    let n = (threads * per_thread) as i128;
    let snapshot = store.snapshot(SAMPLE_SURVEY).expect("survey exists");
    assert_eq!(snapshot.submissions, n as u64);
    assert_eq!(snapshot.total, n * (n - 1) / 2);
}

#[test]
fn snapshots_never_observe_a_torn_pair() {
    // Every fold adds 3, so any consistent state satisfies total == 3 * submissions.
    let store = InMemorySurveyStore::new();
    store.install(sample_schema(SAMPLE_SURVEY)).expect("install");
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..5_000 {
                    store.fold(SAMPLE_SURVEY, 3).expect("survey exists");
                }
            });
        }
        scope.spawn(|| {
            let mut last_seen = 0;
            while !done.load(Ordering::Acquire) {
                let snapshot = store.snapshot(SAMPLE_SURVEY).expect("survey exists");
                assert_eq!(snapshot.total, 3 * i128::from(snapshot.submissions));
                assert!(snapshot.submissions >= last_seen, "snapshots went backwards");
                last_seen = snapshot.submissions;
            }
        });
        scope.spawn(|| {
            while store.snapshot(SAMPLE_SURVEY).map(|s| s.submissions) != Ok(20_000) {
                thread::yield_now();
            }
            done.store(true, Ordering::Release);
        });
    });

    assert_eq!(store.average(SAMPLE_SURVEY), Ok(3.0));
}

#[test]
fn busy_survey_does_not_disturb_another() {
    let store = InMemorySurveyStore::new();
    let busy = SurveyId(1);
    let quiet = SurveyId(2);
    store.install(sample_schema(busy)).expect("install busy");
    store.install(sample_schema(quiet)).expect("install quiet");
    store.fold(quiet, 50).expect("quiet fold");

    thread::scope(|scope| {
        for _ in 0..6 {
            scope.spawn(|| {
                for _ in 0..1_000 {
                    store.fold(busy, 10).expect("busy fold");
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..1_000 {
                let snapshot = store.snapshot(quiet).expect("quiet snapshot");
                assert_eq!(
                    snapshot,
                    TallySnapshot {
                        submissions: 1,
                        total: 50
                    }
                );
            }
        });
    });

    assert_eq!(store.snapshot(busy).map(|s| s.submissions), Ok(6_000));
    assert_eq!(store.average(quiet), Ok(50.0));
}
