use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::{QuestionId, SubmitterId};

const SUBMITTER_COLUMN: &str = "submitter";

/// One submission read from a CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSubmission {
    pub line: u64,
    pub submitter_id: SubmitterId,
    pub answers: BTreeMap<QuestionId, i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionImportError {
    #[error("failed to read submission export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid submission CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("submission CSV must start with a 'submitter' column")]
    MissingSubmitterColumn,
    #[error("column '{0}' is not a numeric question id")]
    InvalidQuestionHeader(String),
    #[error("line {line}: answer '{value}' for question {question} is not an integer")]
    InvalidAnswer {
        line: u64,
        question: QuestionId,
        value: String,
    },
}

pub fn read_submissions(path: &Path) -> Result<Vec<ImportedSubmission>, SubmissionImportError> {
    let file = File::open(path)?;
    parse_submissions(file)
}

/// Parse rows of `submitter,<question id>,<question id>,...`. Empty answer cells are omitted,
/// leaving key validation to the rating step.
pub fn parse_submissions<R: Read>(
    reader: R,
) -> Result<Vec<ImportedSubmission>, SubmissionImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut columns = headers.iter();
    if columns.next() != Some(SUBMITTER_COLUMN) {
        return Err(SubmissionImportError::MissingSubmitterColumn);
    }
    let questions = columns
        .map(|header| {
            header
                .trim_start_matches(['q', 'Q'])
                .parse::<u32>()
                .map(QuestionId)
                .map_err(|_| SubmissionImportError::InvalidQuestionHeader(header.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut submissions = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let submitter_id = SubmitterId::new(record.get(0).unwrap_or_default());

        let mut answers = BTreeMap::new();
        for (question, value) in questions.iter().zip(record.iter().skip(1)) {
            if value.is_empty() {
                continue;
            }
            let answer = value
                .parse::<i32>()
                .map_err(|_| SubmissionImportError::InvalidAnswer {
                    line,
                    question: *question,
                    value: value.to_string(),
                })?;
            answers.insert(*question, answer);
        }

        submissions.push(ImportedSubmission {
            line,
            submitter_id,
            answers,
        });
    }

    Ok(submissions)
}
