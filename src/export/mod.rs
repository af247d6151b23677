pub mod csv;
pub mod report;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::{error::ExportError, models::StoredRecord};

pub use self::csv::{csv_header, to_csv};
pub use report::to_printable_report;

pub const CSV_MIME_TYPE: &str = "text/csv";

/// `analysis_results_2024-03-01.csv`
pub fn csv_file_name(date: DateTime<Utc>) -> String {
    format!("analysis_results_{}.csv", date.format("%Y-%m-%d"))
}

/// A CSV document ready to hand to the host's download mechanism.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    pub file_name: String,
    pub mime_type: String,
    pub body: String,
}

/// Packages `records` as a download. Exporting nothing is refused, like
/// printing.
pub fn csv_export(records: &[StoredRecord], today: DateTime<Utc>) -> Result<CsvExport, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoSelection);
    }

    let export = CsvExport {
        file_name: csv_file_name(today),
        mime_type: CSV_MIME_TYPE.to_string(),
        body: to_csv(records),
    };
    info!("Prepared {} ({} rows)", export.file_name, records.len());
    Ok(export)
}
