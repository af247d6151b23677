use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ExportError, RecordError},
    export::{self, CsvExport},
    models::{ClassificationLabel, StoredRecord},
};

use super::ResultStore;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LabelFilter {
    #[default]
    All,
    Only(ClassificationLabel),
}

impl LabelFilter {
    /// Accepts `"all"` or a label name.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("all") {
            Some(LabelFilter::All)
        } else {
            ClassificationLabel::from_name(value).map(LabelFilter::Only)
        }
    }

    pub fn matches(&self, label: ClassificationLabel) -> bool {
        match self {
            LabelFilter::All => true,
            LabelFilter::Only(expected) => *expected == label,
        }
    }
}

/// Order-preserving subsequence of `records` matching `filter`.
pub fn filter_by(records: &[StoredRecord], filter: LabelFilter) -> Vec<StoredRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record.predicted_class))
        .cloned()
        .collect()
}

/// Selected record ids. Not tied to any filter.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn toggle_one(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// True when `view` is non-empty and every record in it is selected.
    pub fn all_selected(&self, view: &[StoredRecord]) -> bool {
        !view.is_empty() && view.iter().all(|record| self.is_selected(&record.id))
    }

    /// Deselects the ids of `view` if all of them are selected, otherwise
    /// selects all of them. Ids outside `view` are left alone.
    pub fn toggle_all(&mut self, view: &[StoredRecord]) {
        if self.all_selected(view) {
            for record in view {
                self.ids.remove(&record.id);
            }
        } else {
            self.ids
                .extend(view.iter().map(|record| record.id.clone()));
        }
    }

    /// Drops ids that are no longer among `records`.
    pub fn prune(&mut self, records: &[StoredRecord]) {
        let present: HashSet<&str> = records.iter().map(|record| record.id.as_str()).collect();
        self.ids.retain(|id| present.contains(id.as_str()));
    }

    /// Selected records in the order of `records`. Stale ids are ignored.
    pub fn selected_from(&self, records: &[StoredRecord]) -> Vec<StoredRecord> {
        records
            .iter()
            .filter(|record| self.is_selected(&record.id))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<String> for Selection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// State behind the results page: loaded records, active filter, selection.
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    records: Vec<StoredRecord>,
    filter: LabelFilter,
    selection: Selection,
}

impl ResultsView {
    pub fn load(store: &ResultStore) -> Result<Self, RecordError> {
        let mut view = Self::default();
        view.refresh(store)?;
        Ok(view)
    }

    /// Re-reads the store and prunes the selection. Call on every storage
    /// change notification.
    pub fn refresh(&mut self, store: &ResultStore) -> Result<(), RecordError> {
        self.records = store.list()?;
        self.selection.prune(&self.records);
        Ok(())
    }

    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    pub fn filter(&self) -> LabelFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: LabelFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<StoredRecord> {
        filter_by(&self.records, self.filter)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_one(&mut self, id: &str) {
        self.selection.toggle_one(id);
    }

    /// Header checkbox: acts on the visible records only.
    pub fn toggle_all(&mut self) {
        let visible = self.visible();
        self.selection.toggle_all(&visible);
    }

    pub fn all_visible_selected(&self) -> bool {
        self.selection.all_selected(&self.visible())
    }

    pub fn selected_records(&self) -> Vec<StoredRecord> {
        self.selection.selected_from(&self.records)
    }

    /// Number of loaded records per label, every label present.
    pub fn counts(&self) -> BTreeMap<ClassificationLabel, usize> {
        let mut counts: BTreeMap<_, _> = ClassificationLabel::ALL
            .into_iter()
            .map(|label| (label, 0))
            .collect();
        for record in &self.records {
            *counts.entry(record.predicted_class).or_insert(0) += 1;
        }
        counts
    }

    pub fn export_selected_csv(&self, today: DateTime<Utc>) -> Result<CsvExport, ExportError> {
        export::csv_export(&self.selected_records(), today)
    }

    pub fn print_selected(&self, generated_at: DateTime<Utc>) -> Result<String, ExportError> {
        export::to_printable_report(&self.selected_records(), generated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisOutcome, ClassProbabilities};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn outcome(label: ClassificationLabel) -> AnalysisOutcome {
        let probabilities = ClassProbabilities {
            non_demented: 0.25,
            very_mild_demented: 0.25,
            mild_demented: 0.25,
            moderate_demented: 0.25,
        };
        AnalysisOutcome::new(label, probabilities)
    }

    fn seeded(labels: &[ClassificationLabel]) -> ResultStore {
        let store = ResultStore::new(Arc::new(MemoryStorage::new()));
        for (index, label) in labels.iter().enumerate() {
            store
                .append(outcome(*label), &format!("scan{index}.png"))
                .unwrap();
        }
        store
    }

    #[test]
    fn filter_keeps_store_order() {
        use ClassificationLabel::*;
        // Appended oldest first, so the store lists them reversed.
        let store = seeded(&[MildDemented, NonDemented, MildDemented]);
        let records = store.list().unwrap();

        let mild = filter_by(&records, LabelFilter::Only(MildDemented));
        assert_eq!(mild.len(), 2);
        assert_eq!(mild[0].file_name, "scan2.png");
        assert_eq!(mild[1].file_name, "scan0.png");

        assert_eq!(filter_by(&records, LabelFilter::All), records);
        assert!(filter_by(&records, LabelFilter::Only(ModerateDemented)).is_empty());
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!(LabelFilter::parse("all"), Some(LabelFilter::All));
        assert_eq!(
            LabelFilter::parse("NonDemented"),
            Some(LabelFilter::Only(ClassificationLabel::NonDemented))
        );
        assert_eq!(LabelFilter::parse("severe"), None);
    }

    #[test]
    fn toggle_all_is_scoped_to_the_view() {
        use ClassificationLabel::*;
        let store = seeded(&[MildDemented, NonDemented, MildDemented]);
        let mut view = ResultsView::load(&store).unwrap();

        let non_id = view
            .records()
            .iter()
            .find(|record| record.predicted_class == NonDemented)
            .map(|record| record.id.clone())
            .unwrap();
        view.toggle_one(&non_id);

        view.set_filter(LabelFilter::Only(MildDemented));
        view.toggle_all();
        assert!(view.all_visible_selected());
        assert_eq!(view.selection().len(), 3);

        view.toggle_all();
        assert!(view.visible().iter().all(|r| !view.selection().is_selected(&r.id)));
        // Selection made under another filter survives.
        assert!(view.selection().is_selected(&non_id));
        assert_eq!(view.selection().len(), 1);
    }

    #[test]
    fn partial_selection_selects_whole_view() {
        use ClassificationLabel::*;
        let store = seeded(&[MildDemented, MildDemented]);
        let mut view = ResultsView::load(&store).unwrap();
        let first = view.records()[0].id.clone();
        view.toggle_one(&first);

        view.toggle_all();
        assert_eq!(view.selection().len(), 2);
        assert!(view.all_visible_selected());
    }

    #[test]
    fn refresh_prunes_cleared_ids() {
        use ClassificationLabel::*;
        let store = seeded(&[MildDemented, NonDemented]);
        let mut view = ResultsView::load(&store).unwrap();
        view.toggle_all();
        assert_eq!(view.selected_records().len(), 2);

        store.clear().unwrap();
        view.refresh(&store).unwrap();
        assert!(view.selection().is_empty());
        assert_eq!(
            view.print_selected(Utc::now()).unwrap_err(),
            ExportError::NoSelection
        );
    }

    #[test]
    fn stale_ids_are_ignored_before_refresh() {
        use ClassificationLabel::*;
        let store = seeded(&[NonDemented]);
        let view = ResultsView::load(&store).unwrap();
        let mut selection = view.selection().clone();
        selection.toggle_one("1-0");
        assert_eq!(selection.len(), 1);
        assert!(selection.selected_from(view.records()).is_empty());
    }

    #[test]
    fn counts_every_label() {
        use ClassificationLabel::*;
        let store = seeded(&[MildDemented, NonDemented, MildDemented]);
        let counts = ResultsView::load(&store).unwrap().counts();
        assert_eq!(counts[&MildDemented], 2);
        assert_eq!(counts[&NonDemented], 1);
        assert_eq!(counts[&ModerateDemented], 0);
        assert_eq!(counts.len(), 4);
    }
}
