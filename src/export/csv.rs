use crate::models::{percent_value, ClassificationLabel, StoredRecord};

/// Column headers, in row order.
pub fn csv_header() -> Vec<String> {
    let mut header: Vec<String> = ["Date", "File Name", "Predicted Class", "Confidence (%)"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(
        ClassificationLabel::ALL
            .iter()
            .map(|label| format!("{label} (%)")),
    );
    header
}

fn csv_row(record: &StoredRecord) -> Vec<String> {
    let mut row = vec![
        record.timestamp.clone(),
        record.file_name.clone(),
        record.predicted_class.to_string(),
        percent_value(record.confidence()),
    ];
    row.extend(
        record
            .class_probabilities
            .entries()
            .iter()
            .map(|(_, probability)| percent_value(*probability)),
    );
    row
}

/// Header plus one row per record, in input order. Percentages carry one
/// decimal place and no percent sign.
pub fn to_csv(records: &[StoredRecord]) -> String {
    let mut csv = String::new();
    for row in std::iter::once(csv_header()).chain(records.iter().map(csv_row)) {
        let line = row
            .iter()
            .map(|field| escape_csv(field))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

fn escape_csv(value: &str) -> String {
    let needs_quotes = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quotes {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassProbabilities;

    fn record(file_name: &str) -> StoredRecord {
        StoredRecord {
            id: "1-0".into(),
            timestamp: "2024-03-01T09:30:00.000Z".into(),
            file_name: file_name.into(),
            predicted_class: ClassificationLabel::MildDemented,
            class_probabilities: ClassProbabilities {
                non_demented: 0.05,
                very_mild_demented: 0.10,
                mild_demented: 0.70,
                moderate_demented: 0.15,
            },
        }
    }

    #[test]
    fn header_lists_every_label() {
        let csv = to_csv(&[]);
        assert_eq!(
            csv,
            "Date,File Name,Predicted Class,Confidence (%),NonDemented (%),VeryMildDemented (%),MildDemented (%),ModerateDemented (%)\n"
        );
    }

    #[test]
    fn row_matches_header() {
        let csv = to_csv(&[record("scan1.png")]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2024-03-01T09:30:00.000Z,scan1.png,MildDemented,70.0,5.0,10.0,70.0,15.0"
        );
    }

    #[test]
    fn awkward_file_names_are_quoted() {
        let csv = to_csv(&[record("left, \"axial\".png")]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("2024-03-01T09:30:00.000Z,\"left, \"\"axial\"\".png\",MildDemented"));
    }
}
