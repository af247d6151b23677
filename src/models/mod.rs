pub mod label;
pub mod outcome;
pub mod record;

pub use label::{ClassificationLabel, SeverityColor};
pub use outcome::{
    format_percent, percent_value, AnalysisOutcome, ClassProbabilities, IntegrityWarning,
    PredictionPayload, ValidatedOutcome, DEFAULT_PROBABILITY_TOLERANCE,
};
pub use record::StoredRecord;
