use thiserror::Error;

/// Failures of the result store and of the collaborator payloads feeding it.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("result storage is unavailable: {0}")]
    PersistenceUnavailable(#[source] anyhow::Error),

    #[error("malformed analysis outcome: {0}")]
    MalformedOutcome(String),
}

impl RecordError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        RecordError::MalformedOutcome(reason.into())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExportError {
    #[error("select at least one result before exporting")]
    NoSelection,
}

impl From<serde_json::Error> for RecordError {
    fn from(error: serde_json::Error) -> Self {
        RecordError::MalformedOutcome(error.to_string())
    }
}
