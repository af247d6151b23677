//! User actions exposed to the front end. Every error comes back as a message
//! the page shows inline; nothing here panics.

use chrono::Utc;
use serde::Serialize;

use crate::{
    export::{self, CsvExport},
    models::{PredictionPayload, StoredRecord},
    prompts::{PromptRequest, TextStream},
    results::{filter_by, LabelFilter, Selection},
    reveal::RevealSnapshot,
    AppState,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedAnalysis {
    pub record: StoredRecord,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceStatus {
    pub degraded: bool,
    pub message: Option<String>,
}

/// Validates a prediction response and appends it to the history.
/// `file_name` falls back to the name echoed by the prediction service.
pub fn record_analysis(
    state: &AppState,
    payload_json: &str,
    file_name: &str,
) -> Result<RecordedAnalysis, String> {
    let payload = PredictionPayload::from_json(payload_json).map_err(|e| {
        log_warn!("Rejected prediction payload: {e}");
        e.to_string()
    })?;

    let file_name = match (file_name.trim(), payload.file_name.as_deref()) {
        ("", Some(echoed)) => echoed.to_string(),
        (given, _) => given.to_string(),
    };

    let validated = payload
        .validate(state.store.tolerance())
        .map_err(|e| e.to_string())?;
    for warning in &validated.warnings {
        log_warn!("Integrity warning for {file_name}: {warning}");
    }

    let record = state
        .store
        .append(validated.outcome, &file_name)
        .map_err(|e| {
            log_error!("Failed to store analysis for {file_name}: {e}");
            e.to_string()
        })?;

    Ok(RecordedAnalysis {
        record,
        warnings: validated.warnings.iter().map(ToString::to_string).collect(),
    })
}

/// `filter` is `"all"` or a label name.
pub fn list_results(state: &AppState, filter: &str) -> Result<Vec<StoredRecord>, String> {
    let filter = LabelFilter::parse(filter).ok_or_else(|| format!("unknown filter '{filter}'"))?;
    let records = state.store.list().map_err(|e| e.to_string())?;
    Ok(filter_by(&records, filter))
}

pub fn clear_results(state: &AppState) -> Result<(), String> {
    state.store.clear().map_err(|e| e.to_string())
}

/// Selected records in store order. Ids that no longer exist are skipped.
fn selected_records(state: &AppState, ids: &[String]) -> Result<Vec<StoredRecord>, String> {
    let records = state.store.list().map_err(|e| e.to_string())?;
    let selection: Selection = ids.iter().cloned().collect();
    Ok(selection.selected_from(&records))
}

pub fn export_csv(state: &AppState, ids: &[String]) -> Result<CsvExport, String> {
    let records = selected_records(state, ids)?;
    export::csv_export(&records, Utc::now()).map_err(|e| e.to_string())
}

pub fn print_report(state: &AppState, ids: &[String]) -> Result<String, String> {
    let records = selected_records(state, ids)?;
    export::to_printable_report(&records, Utc::now()).map_err(|e| e.to_string())
}

pub fn build_prompt(stream: TextStream, request_json: &str) -> Result<String, String> {
    let request = PromptRequest::from_json(request_json).map_err(|e| e.to_string())?;
    Ok(request.prompt(stream))
}

/// Feeds freshly generated text to the stream's controller at the configured
/// cadence, replacing whatever it was showing.
pub async fn start_reveal(state: &AppState, stream: TextStream, text: String) -> RevealSnapshot {
    let reveal = state.settings.reveal();
    let cadence = match stream {
        TextStream::Interpretation => reveal.interpretation_cadence(),
        TextStream::Treatment => reveal.treatment_cadence(),
    };
    state.reveal(stream).start(text, cadence).await
}

pub async fn reveal_snapshot(state: &AppState, stream: TextStream) -> RevealSnapshot {
    state.reveal(stream).snapshot().await
}

pub async fn cancel_reveal(state: &AppState, stream: TextStream) {
    state.reveal(stream).cancel().await
}

pub fn persistence_status(state: &AppState) -> PersistenceStatus {
    let degraded = state.persistence_degraded();
    PersistenceStatus {
        degraded,
        message: degraded.then(|| {
            "Results cannot be saved on this device; they will be lost when the app closes."
                .to_string()
        }),
    }
}
