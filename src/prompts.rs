//! Prompts for the two generated-text streams shown next to a result.

use serde::{Deserialize, Serialize};

use crate::{
    error::RecordError,
    models::{percent_value, ClassificationLabel},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TextStream {
    /// Reading of the attention map.
    Interpretation,
    /// Management and treatment suggestions.
    Treatment,
}

/// Body sent to the text-generation routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PromptRequest {
    pub prediction: ClassificationLabel,
    pub confidence: f64,
}

impl PromptRequest {
    pub fn new(prediction: ClassificationLabel, confidence: f64) -> Result<Self, RecordError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(RecordError::malformed(format!(
                "confidence {confidence} is outside [0, 1]"
            )));
        }
        Ok(Self {
            prediction,
            confidence,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        let request: PromptRequest = serde_json::from_str(raw)?;
        Self::new(request.prediction, request.confidence)
    }

    pub fn prompt(&self, stream: TextStream) -> String {
        match stream {
            TextStream::Interpretation => interpretation_prompt(self),
            TextStream::Treatment => treatment_prompt(self),
        }
    }
}

fn interpretation_prompt(request: &PromptRequest) -> String {
    let prediction = request.prediction;
    let confidence = percent_value(request.confidence);
    format!(
        "As a neuroradiology expert, interpret the attention map visualization for an MRI scan \
that was classified as {prediction} with {confidence}% confidence.

The attention map uses a \"jet\" colormap where:
- Blue/Dark Blue indicates areas of low attention
- Cyan/Yellow indicates areas of medium attention
- Orange/Red indicates areas of high attention

Based on this classification and typical patterns in brain MRI attention maps:
1. What regions of the brain is the model likely focusing on?
2. Why are these regions significant for this classification?
3. What are the key anatomical features being highlighted?
4. How does this align with known patterns in {prediction} cases?

Please provide a concise, technical interpretation focusing on the attention map's significance."
    )
}

fn treatment_prompt(request: &PromptRequest) -> String {
    let prediction = request.prediction;
    let confidence = percent_value(request.confidence);
    format!(
        "As a medical expert, provide detailed treatment and management suggestions for a patient \
diagnosed with {prediction} (confidence: {confidence}%).

Please provide specific recommendations in these areas:

1. Key Management Strategies:
- What are the essential medical interventions?
- What type of cognitive therapies would be most beneficial?
- What daily routine adjustments are recommended?

2. Lifestyle Recommendations:
- What physical activities are most appropriate?
- What dietary considerations should be taken into account?
- What cognitive exercises or activities would be most beneficial?

3. Monitoring Considerations:
- What symptoms or changes should be monitored?
- What is the recommended frequency for medical check-ups?
- What potential complications should be watched for?

Please provide evidence-based, practical recommendations that can be implemented by healthcare \
providers and caregivers."
    )
}
