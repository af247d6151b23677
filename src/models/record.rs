use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{AnalysisOutcome, ClassProbabilities, ClassificationLabel, IntegrityWarning};

/// One persisted analysis. Field names match the stored JSON layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub predicted_class: ClassificationLabel,
    pub class_probabilities: ClassProbabilities,
}

impl StoredRecord {
    pub(crate) fn new(
        id: String,
        recorded_at: DateTime<Utc>,
        file_name: String,
        outcome: AnalysisOutcome,
    ) -> Self {
        Self {
            id,
            timestamp: recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            file_name,
            predicted_class: outcome.predicted_class,
            class_probabilities: outcome.class_probabilities,
        }
    }

    pub fn outcome(&self) -> AnalysisOutcome {
        AnalysisOutcome::new(self.predicted_class, self.class_probabilities)
    }

    /// Probability of the predicted class.
    pub fn confidence(&self) -> f64 {
        self.class_probabilities.get(self.predicted_class)
    }

    pub fn integrity_warning(&self) -> Option<IntegrityWarning> {
        self.outcome().integrity_warning()
    }

    pub fn recorded_at(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("failed to parse timestamp of record {}", self.id))
    }

    /// Probabilities of every class except the predicted one, highest first.
    pub fn other_probabilities(&self) -> Vec<(ClassificationLabel, f64)> {
        let mut others: Vec<_> = self
            .class_probabilities
            .entries()
            .into_iter()
            .filter(|(label, _)| *label != self.predicted_class)
            .collect();
        others.sort_by(|a, b| b.1.total_cmp(&a.1));
        others
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> StoredRecord {
        let outcome = AnalysisOutcome::new(
            ClassificationLabel::MildDemented,
            ClassProbabilities {
                non_demented: 0.05,
                very_mild_demented: 0.10,
                mild_demented: 0.70,
                moderate_demented: 0.15,
            },
        );
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        StoredRecord::new("1709285400000-0".into(), at, "scan1.png".into(), outcome)
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["fileName"], "scan1.png");
        assert_eq!(value["timestamp"], "2024-03-01T09:30:00.000Z");
        assert_eq!(value["predicted_class"], "MildDemented");
        assert_eq!(value["class_probabilities"]["ModerateDemented"], 0.15);
    }

    #[test]
    fn others_are_sorted_descending() {
        let labels: Vec<_> = record()
            .other_probabilities()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec![
                ClassificationLabel::ModerateDemented,
                ClassificationLabel::VeryMildDemented,
                ClassificationLabel::NonDemented,
            ]
        );
    }

    #[test]
    fn timestamp_round_trips() {
        let at = record().recorded_at().unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
    }
}
