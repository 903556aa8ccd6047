// File: src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between loading the table and logging a case.
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// The main likelihood table does not exist. Fatal, raised before any prompt.
    #[error("data source not found: {}", path.display())]
    MissingDataSource { path: PathBuf },

    /// Every category scored zero, so the posterior cannot be normalized.
    #[error("evidence rules out every category; posterior cannot be normalized")]
    DegenerateEvidence,

    /// A confirmation or correction named a category we do not know.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// A table row is missing a column or holds an unusable value.
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: String, reason: String },

    #[error("observation does not match the symptom set: {0}")]
    IncompleteObservation(String),

    #[error("counters are empty or all zero; priors cannot be derived")]
    EmptyCounters,

    #[error("case log header in {} does not match the current table", path.display())]
    CaseLogSchema { path: PathBuf },

    #[error("input closed before the session finished")]
    InputClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiagnosisError {
    /// Load-time errors end the session; the rest are reported and the session goes on.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DiagnosisError::UnknownCategory(_) | DiagnosisError::CaseLogSchema { .. }
        )
    }

    pub(crate) fn malformed(row: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        DiagnosisError::MalformedRow { row: row.to_string(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, DiagnosisError>;
