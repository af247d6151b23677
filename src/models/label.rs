use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification produced by the MRI model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassificationLabel {
    NonDemented,
    VeryMildDemented,
    MildDemented,
    ModerateDemented,
}

impl ClassificationLabel {
    /// All labels, in severity order. Also the column order of every export.
    pub const ALL: [ClassificationLabel; 4] = [
        ClassificationLabel::NonDemented,
        ClassificationLabel::VeryMildDemented,
        ClassificationLabel::MildDemented,
        ClassificationLabel::ModerateDemented,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::NonDemented => "NonDemented",
            ClassificationLabel::VeryMildDemented => "VeryMildDemented",
            ClassificationLabel::MildDemented => "MildDemented",
            ClassificationLabel::ModerateDemented => "ModerateDemented",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == value)
    }

    pub fn severity(&self) -> u8 {
        match self {
            ClassificationLabel::NonDemented => 0,
            ClassificationLabel::VeryMildDemented => 1,
            ClassificationLabel::MildDemented => 2,
            ClassificationLabel::ModerateDemented => 3,
        }
    }

    pub fn color(&self) -> SeverityColor {
        match self {
            ClassificationLabel::NonDemented => SeverityColor::Green,
            ClassificationLabel::VeryMildDemented => SeverityColor::Yellow,
            ClassificationLabel::MildDemented => SeverityColor::Orange,
            ClassificationLabel::ModerateDemented => SeverityColor::Red,
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge colour for a label. The live results table and the printable report
/// both read from here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SeverityColor {
    Green,
    Yellow,
    Orange,
    Red,
}

impl SeverityColor {
    pub fn name(&self) -> &'static str {
        match self {
            SeverityColor::Green => "green",
            SeverityColor::Yellow => "yellow",
            SeverityColor::Orange => "orange",
            SeverityColor::Red => "red",
        }
    }

    /// Foreground / bar colour.
    pub fn hex(&self) -> &'static str {
        match self {
            SeverityColor::Green => "#16a34a",
            SeverityColor::Yellow => "#ca8a04",
            SeverityColor::Orange => "#ea580c",
            SeverityColor::Red => "#dc2626",
        }
    }

    /// Pale background used behind badge text.
    pub fn badge_background_hex(&self) -> &'static str {
        match self {
            SeverityColor::Green => "#dcfce7",
            SeverityColor::Yellow => "#fef9c3",
            SeverityColor::Orange => "#ffedd5",
            SeverityColor::Red => "#fee2e2",
        }
    }

    /// Utility classes for the web results table.
    pub fn badge_classes(&self) -> String {
        let name = self.name();
        format!("bg-{name}-100 text-{name}-800")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_severity() {
        let colors: Vec<_> = ClassificationLabel::ALL
            .iter()
            .map(|label| label.color().name())
            .collect();
        assert_eq!(colors, vec!["green", "yellow", "orange", "red"]);

        let severities: Vec<_> = ClassificationLabel::ALL
            .iter()
            .map(ClassificationLabel::severity)
            .collect();
        assert_eq!(severities, vec![0, 1, 2, 3]);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!(
            ClassificationLabel::from_name("VeryMildDemented"),
            Some(ClassificationLabel::VeryMildDemented)
        );
        assert_eq!(ClassificationLabel::from_name("Demented"), None);
        assert_eq!(
            serde_json::to_string(&ClassificationLabel::MildDemented).unwrap(),
            "\"MildDemented\""
        );
        assert_eq!(
            ClassificationLabel::ModerateDemented.color().badge_classes(),
            "bg-red-100 text-red-800"
        );
    }
}
