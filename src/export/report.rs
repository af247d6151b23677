//! Printable analysis report: one page per record, rendered as a standalone
//! HTML document for the host's print dialog.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    error::ExportError,
    models::{format_percent, StoredRecord},
};

const REPORT_STYLE: &str = r#"
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: -apple-system, 'Helvetica Neue', Helvetica, Arial, sans-serif; color: #111827; }
    .page { padding: 48px; min-height: 100vh; }
    .page + .page { break-before: page; page-break-before: always; }
    .page header { border-bottom: 1px solid #e5e7eb; padding-bottom: 16px; margin-bottom: 24px; }
    .page h1 { font-size: 22px; margin-bottom: 8px; }
    .meta { color: #6b7280; font-size: 13px; line-height: 1.6; }
    .badge { display: inline-block; padding: 2px 10px; border-radius: 9999px; font-size: 13px; font-weight: 600; }
    .prediction { margin-bottom: 32px; }
    .prediction .confidence { margin-top: 8px; color: #374151; }
    .bar-row { margin-bottom: 14px; }
    .bar-label { display: flex; justify-content: space-between; font-size: 13px; margin-bottom: 4px; }
    .bar-track { height: 10px; background: #f3f4f6; border-radius: 9999px; overflow: hidden; }
    .bar-fill { height: 100%; border-radius: 9999px; }
    .integrity { margin-top: 24px; padding: 8px 12px; border: 1px solid #fca5a5; color: #991b1b; font-size: 12px; }
    footer { margin-top: 32px; color: #9ca3af; font-size: 11px; }
    @media print { .page { min-height: auto; } }
"#;

/// Renders one page per record. An empty slice is refused: the caller must
/// ask the user to select something first.
pub fn to_printable_report(
    records: &[StoredRecord],
    generated_at: DateTime<Utc>,
) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoSelection);
    }

    let generated = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>MRI Analysis Report</title>\n<style>{REPORT_STYLE}</style>\n</head>\n<body>\n"
    ));

    for record in records {
        write_page(&mut html, record, &generated);
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn write_page(html: &mut String, record: &StoredRecord, generated: &str) {
    let color = record.predicted_class.color();

    html.push_str(&format!(
        "<section class=\"page\" data-record-id=\"{id}\">\n\
         <header>\n<h1>MRI Analysis Report</h1>\n\
         <p class=\"meta\">File: {file}<br>Analyzed: {timestamp}</p>\n</header>\n",
        id = escape_text(&record.id),
        file = escape_text(&record.file_name),
        timestamp = escape_text(&record.timestamp),
    ));

    html.push_str(&format!(
        "<div class=\"prediction\">\n\
         <span class=\"badge severity-{name}\" style=\"background:{background};color:{foreground}\">{label}</span>\n\
         <p class=\"confidence\">Confidence: {confidence}</p>\n</div>\n",
        name = color.name(),
        background = color.badge_background_hex(),
        foreground = color.hex(),
        label = record.predicted_class,
        confidence = format_percent(record.confidence()),
    ));

    html.push_str("<div class=\"others\">\n<h2 class=\"meta\">Other classes</h2>\n");
    for (label, probability) in record.other_probabilities() {
        html.push_str(&format!(
            "<div class=\"bar-row\">\n\
             <div class=\"bar-label\"><span>{label}</span><span>{percent}</span></div>\n\
             <div class=\"bar-track\"><div class=\"bar-fill\" style=\"width:{width:.1}%;background:{fill}\"></div></div>\n\
             </div>\n",
            percent = format_percent(probability),
            width = (probability * 100.0).clamp(0.0, 100.0),
            fill = label.color().hex(),
        ));
    }
    html.push_str("</div>\n");

    if let Some(warning) = record.integrity_warning() {
        html.push_str(&format!(
            "<p class=\"integrity\">Data integrity warning: {}</p>\n",
            escape_text(&warning.to_string())
        ));
    }

    html.push_str(&format!("<footer>Generated {generated}</footer>\n</section>\n"));
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
