use crate::infra::InMemoryReceiptLog;
use clap::Args;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use survey_tally::config::{AppConfig, ConfigError, DemoConfig};
use survey_tally::error::AppError;
use survey_tally::surveys::{
    read_submissions, InMemorySurveyStore, QuestionId, SubmitterId, SurveyError, SurveyId,
    SurveyService,
};

type DemoService = SurveyService<InMemorySurveyStore, InMemoryReceiptLog>;

const ANSWER_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

const SAMPLE_QUESTIONS: [(u32, &str, i32); 3] = [
    (1, "How is the service quality?", 2),
    (2, "How is the product quality?", 4),
    (3, "How is the staff behavior?", 5),
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of worker threads submitting concurrently (defaults to SURVEY_DEMO_WORKERS).
    #[arg(long)]
    pub(crate) workers: Option<usize>,
    /// Submissions per worker (defaults to SURVEY_DEMO_SUBMISSIONS).
    #[arg(long)]
    pub(crate) submissions: Option<usize>,
    /// Survey id used for the sample survey.
    #[arg(long, default_value_t = 1)]
    pub(crate) survey_id: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ReplayArgs {
    /// CSV export with a `submitter` column followed by one column per question id
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Survey id used for the sample survey.
    #[arg(long, default_value_t = 1)]
    pub(crate) survey_id: u32,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoConfig {
        workers,
        submissions_per_worker,
    } = resolve_pool(&args, AppConfig::load()?.demo)?;
    let survey_id = SurveyId(args.survey_id);

    let (service, receipts) = seed_sample_survey(survey_id)?;
    println!("Survey created successfully with ID: {survey_id}");
    println!("Starting concurrent submissions ({workers} workers x {submissions_per_worker})...");

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for step in 0..submissions_per_worker {
                    let submitter = format!("user_{worker}_{step}");
                    match service.submit_survey(
                        survey_id,
                        SubmitterId::new(submitter.clone()),
                        sample_answers(&mut rng),
                    ) {
                        Ok(rating) => {
                            println!("Worker {worker}, User {submitter}, Rating: {rating}")
                        }
                        Err(err) => eprintln!("Submission failed in worker {worker}: {err}"),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("a submission worker panicked");
        }
    }
    println!("All submissions completed.");

    print_results(&service, survey_id)?;
    println!("Distinct submitters with receipts: {}", receipts.len());
    Ok(())
}

/// Apply `--workers` / `--submissions` over the configured pool, holding both to the same
/// positive-integer rule as `SURVEY_DEMO_WORKERS` and `SURVEY_DEMO_SUBMISSIONS`.
fn resolve_pool(args: &DemoArgs, configured: DemoConfig) -> Result<DemoConfig, ConfigError> {
    let workers = positive_override("--workers", args.workers, configured.workers)?;
    let submissions_per_worker = positive_override(
        "--submissions",
        args.submissions,
        configured.submissions_per_worker,
    )?;
    Ok(DemoConfig {
        workers,
        submissions_per_worker,
    })
}

fn positive_override(
    name: &'static str,
    value: Option<usize>,
    configured: usize,
) -> Result<usize, ConfigError> {
    match value {
        None => Ok(configured),
        Some(0) => Err(ConfigError::InvalidDemoSetting {
            name,
            value: "0".to_string(),
        }),
        Some(value) => Ok(value),
    }
}

pub(crate) fn run_replay(args: ReplayArgs) -> Result<(), AppError> {
    let survey_id = SurveyId(args.survey_id);
    let rows = read_submissions(&args.csv)?;
    let (service, _) = seed_sample_survey(survey_id)?;

    println!("Replaying {} submissions from {}", rows.len(), args.csv.display());
    let mut rejected = 0usize;
    for row in rows {
        match service.submit_survey(survey_id, row.submitter_id.clone(), row.answers) {
            Ok(rating) => println!("line {}: {} rated {}", row.line, row.submitter_id, rating),
            Err(err @ SurveyError::InvalidResponse { .. }) => {
                rejected += 1;
                println!("line {}: skipped ({err})", row.line);
            }
            Err(err) => return Err(err.into()),
        }
    }
    if rejected > 0 {
        println!("{rejected} rows rejected");
    }

    print_results(&service, survey_id)
}

fn seed_sample_survey(
    survey_id: SurveyId,
) -> Result<(Arc<DemoService>, Arc<InMemoryReceiptLog>), AppError> {
    let receipts = Arc::new(InMemoryReceiptLog::default());
    let service = Arc::new(SurveyService::new(
        Arc::new(InMemorySurveyStore::new()),
        receipts.clone(),
    ));

    let questions: BTreeMap<_, _> = SAMPLE_QUESTIONS
        .iter()
        .map(|(id, text, _)| (QuestionId(*id), text.to_string()))
        .collect();
    let weights: BTreeMap<_, _> = SAMPLE_QUESTIONS
        .iter()
        .map(|(id, _, weight)| (QuestionId(*id), *weight))
        .collect();
    service.create_survey(survey_id, questions, weights)?;

    Ok((service, receipts))
}

fn print_results(service: &DemoService, survey_id: SurveyId) -> Result<(), AppError> {
    let summary = service.summary(survey_id)?;
    let schema = service.survey(survey_id)?;

    println!("\n=== SURVEY RESULTS ===");
    println!("Survey ID: {}", summary.survey_id);
    println!("Total Submissions: {}", summary.submissions);
    println!("Average Rating: {:.2}", summary.average_rating);
    println!("\nSurvey Questions:");
    for (id, question) in schema.questions() {
        let weight = schema.weight(*id).unwrap_or_default();
        println!("Q{id}: {question} (Weight: {weight})");
    }
    Ok(())
}

fn sample_answers<R: Rng>(rng: &mut R) -> BTreeMap<QuestionId, i32> {
    SAMPLE_QUESTIONS
        .iter()
        .map(|(id, _, _)| (QuestionId(*id), rng.gen_range(ANSWER_RANGE)))
        .collect()
}
