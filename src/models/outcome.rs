use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RecordError;

use super::ClassificationLabel;

/// Allowed distance between the probability sum and 1.0.
pub const DEFAULT_PROBABILITY_TOLERANCE: f64 = 0.01;

/// Output order of the prediction service's softmax vector.
pub const MODEL_OUTPUT_ORDER: [ClassificationLabel; 4] = [
    ClassificationLabel::MildDemented,
    ClassificationLabel::ModerateDemented,
    ClassificationLabel::NonDemented,
    ClassificationLabel::VeryMildDemented,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ClassProbabilities {
    pub non_demented: f64,
    pub very_mild_demented: f64,
    pub mild_demented: f64,
    pub moderate_demented: f64,
}

impl ClassProbabilities {
    pub fn get(&self, label: ClassificationLabel) -> f64 {
        match label {
            ClassificationLabel::NonDemented => self.non_demented,
            ClassificationLabel::VeryMildDemented => self.very_mild_demented,
            ClassificationLabel::MildDemented => self.mild_demented,
            ClassificationLabel::ModerateDemented => self.moderate_demented,
        }
    }

    fn slot_mut(&mut self, label: ClassificationLabel) -> &mut f64 {
        match label {
            ClassificationLabel::NonDemented => &mut self.non_demented,
            ClassificationLabel::VeryMildDemented => &mut self.very_mild_demented,
            ClassificationLabel::MildDemented => &mut self.mild_demented,
            ClassificationLabel::ModerateDemented => &mut self.moderate_demented,
        }
    }

    /// Pairs in severity order.
    pub fn entries(&self) -> [(ClassificationLabel, f64); 4] {
        ClassificationLabel::ALL.map(|label| (label, self.get(label)))
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, value)| value).sum()
    }

    /// Highest-probability label; ties go to the less severe label.
    pub fn argmax(&self) -> ClassificationLabel {
        let mut best = (ClassificationLabel::NonDemented, self.non_demented);
        for (label, value) in self.entries() {
            if value > best.1 {
                best = (label, value);
            }
        }
        best.0
    }

    pub fn validate(&self, tolerance: f64) -> Result<(), RecordError> {
        for (label, value) in self.entries() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(RecordError::malformed(format!(
                    "probability for {label} is {value}, expected a value in [0, 1]"
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(RecordError::malformed(format!(
                "class probabilities sum to {sum:.4}, expected 1.0 (tolerance {tolerance})"
            )));
        }

        Ok(())
    }
}

/// Data-integrity problems that are flagged but never block storage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum IntegrityWarning {
    PredictedNotArgmax {
        predicted: ClassificationLabel,
        argmax: ClassificationLabel,
    },
    ConfidenceMismatch {
        reported: f64,
        expected: f64,
    },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::PredictedNotArgmax { predicted, argmax } => write!(
                f,
                "predicted class {predicted} is not the most probable class ({argmax})"
            ),
            IntegrityWarning::ConfidenceMismatch { reported, expected } => write!(
                f,
                "reported confidence {reported:.4} differs from the predicted class probability {expected:.4}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOutcome {
    pub predicted_class: ClassificationLabel,
    pub class_probabilities: ClassProbabilities,
}

impl AnalysisOutcome {
    pub fn new(predicted_class: ClassificationLabel, class_probabilities: ClassProbabilities) -> Self {
        Self {
            predicted_class,
            class_probabilities,
        }
    }

    /// Builds an outcome from a raw softmax vector in [`MODEL_OUTPUT_ORDER`].
    pub fn from_scores(scores: &[f64]) -> Result<Self, RecordError> {
        if scores.len() != MODEL_OUTPUT_ORDER.len() {
            return Err(RecordError::malformed(format!(
                "expected {} class scores, got {}",
                MODEL_OUTPUT_ORDER.len(),
                scores.len()
            )));
        }

        let mut probabilities = ClassProbabilities {
            non_demented: 0.0,
            very_mild_demented: 0.0,
            mild_demented: 0.0,
            moderate_demented: 0.0,
        };
        for (label, score) in MODEL_OUTPUT_ORDER.iter().zip(scores) {
            *probabilities.slot_mut(*label) = *score;
        }

        Ok(Self::new(probabilities.argmax(), probabilities))
    }

    pub fn confidence(&self) -> f64 {
        self.class_probabilities.get(self.predicted_class)
    }

    pub fn integrity_warning(&self) -> Option<IntegrityWarning> {
        let argmax = self.class_probabilities.argmax();
        let predicted = self.predicted_class;
        // Equal probabilities are not a disagreement.
        if argmax != predicted
            && self.class_probabilities.get(argmax) > self.class_probabilities.get(predicted)
        {
            Some(IntegrityWarning::PredictedNotArgmax { predicted, argmax })
        } else {
            None
        }
    }
}

/// Response body of the prediction service. Only `predicted_class` and
/// `class_probabilities` are kept; the rest is cross-checked or ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionPayload {
    pub predicted_class: ClassificationLabel,
    pub class_probabilities: ClassProbabilities,
    pub file_name: Option<String>,
    pub confidence: Option<f64>,
    pub attention_map_visualization: Option<String>,
}

/// An outcome that passed shape validation, plus any integrity flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOutcome {
    pub outcome: AnalysisOutcome,
    pub warnings: Vec<IntegrityWarning>,
}

impl PredictionPayload {
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(self, tolerance: f64) -> Result<ValidatedOutcome, RecordError> {
        let outcome = AnalysisOutcome::new(self.predicted_class, self.class_probabilities);
        outcome.class_probabilities.validate(tolerance)?;

        let mut warnings: Vec<IntegrityWarning> = outcome.integrity_warning().into_iter().collect();
        if let Some(reported) = self.confidence {
            let expected = outcome.confidence();
            if (reported - expected).abs() > tolerance {
                warnings.push(IntegrityWarning::ConfidenceMismatch { reported, expected });
            }
        }

        Ok(ValidatedOutcome { outcome, warnings })
    }
}

/// `0.7` -> `"70.0"`.
pub fn percent_value(probability: f64) -> String {
    format!("{:.1}", probability * 100.0)
}

/// `0.7` -> `"70.0%"`.
pub fn format_percent(probability: f64) -> String {
    format!("{}%", percent_value(probability))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(non: f64, very_mild: f64, mild: f64, moderate: f64) -> ClassProbabilities {
        ClassProbabilities {
            non_demented: non,
            very_mild_demented: very_mild,
            mild_demented: mild,
            moderate_demented: moderate,
        }
    }

    #[test]
    fn payload_with_extra_fields_is_accepted() {
        let raw = r#"{
            "file_name": "scan1.png",
            "predicted_class": "MildDemented",
            "confidence": 0.70,
            "class_probabilities": {
                "MildDemented": 0.70,
                "ModerateDemented": 0.15,
                "NonDemented": 0.05,
                "VeryMildDemented": 0.10
            }
        }"#;

        let validated = PredictionPayload::from_json(raw)
            .unwrap()
            .validate(DEFAULT_PROBABILITY_TOLERANCE)
            .unwrap();
        assert_eq!(validated.outcome.predicted_class, ClassificationLabel::MildDemented);
        assert!(validated.warnings.is_empty());
        assert!((validated.outcome.confidence() - 0.70).abs() < f64::EPSILON);
    }

    #[test]
    fn payload_missing_a_label_is_malformed() {
        let raw = r#"{
            "predicted_class": "NonDemented",
            "class_probabilities": { "NonDemented": 0.9, "MildDemented": 0.1 }
        }"#;
        let err = PredictionPayload::from_json(raw).unwrap_err();
        assert!(matches!(err, RecordError::MalformedOutcome(_)));
        assert!(err.to_string().contains("VeryMildDemented"));
    }

    #[test]
    fn payload_with_unknown_class_is_malformed() {
        let raw = r#"{
            "predicted_class": "Severe",
            "class_probabilities": {
                "NonDemented": 1.0, "VeryMildDemented": 0.0,
                "MildDemented": 0.0, "ModerateDemented": 0.0
            }
        }"#;
        assert!(matches!(
            PredictionPayload::from_json(raw),
            Err(RecordError::MalformedOutcome(_))
        ));
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        assert!(probs(0.25, 0.25, 0.25, 0.25).validate(DEFAULT_PROBABILITY_TOLERANCE).is_ok());
        assert!(probs(0.5, 0.5, 0.5, 0.0).validate(DEFAULT_PROBABILITY_TOLERANCE).is_err());
        assert!(probs(1.2, -0.2, 0.0, 0.0).validate(DEFAULT_PROBABILITY_TOLERANCE).is_err());
        assert!(probs(f64::NAN, 0.0, 0.0, 1.0).validate(DEFAULT_PROBABILITY_TOLERANCE).is_err());
    }

    #[test]
    fn non_argmax_prediction_is_flagged_not_rejected() {
        let payload = PredictionPayload {
            predicted_class: ClassificationLabel::NonDemented,
            class_probabilities: probs(0.1, 0.2, 0.6, 0.1),
            file_name: None,
            confidence: Some(0.6),
            attention_map_visualization: None,
        };

        let validated = payload.validate(DEFAULT_PROBABILITY_TOLERANCE).unwrap();
        assert_eq!(
            validated.warnings,
            vec![
                IntegrityWarning::PredictedNotArgmax {
                    predicted: ClassificationLabel::NonDemented,
                    argmax: ClassificationLabel::MildDemented,
                },
                IntegrityWarning::ConfidenceMismatch {
                    reported: 0.6,
                    expected: 0.1,
                },
            ]
        );
    }

    #[test]
    fn scores_follow_model_output_order() {
        let outcome = AnalysisOutcome::from_scores(&[0.05, 0.8, 0.1, 0.05]).unwrap();
        assert_eq!(outcome.predicted_class, ClassificationLabel::ModerateDemented);
        assert_eq!(outcome.class_probabilities.get(ClassificationLabel::NonDemented), 0.1);
        assert!(AnalysisOutcome::from_scores(&[1.0]).is_err());
    }

    #[test]
    fn percent_formatting_uses_one_decimal() {
        assert_eq!(percent_value(0.7), "70.0");
        assert_eq!(format_percent(0.12345), "12.3%");
        assert_eq!(format_percent(1.0), "100.0%");
    }
}
