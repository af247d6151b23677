use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::sync::watch;

use crate::{
    error::RecordError,
    models::{AnalysisOutcome, StoredRecord, DEFAULT_PROBABILITY_TOLERANCE},
    storage::SlotStorage,
};

/// Slot holding the JSON array of records, newest first.
pub const RESULTS_SLOT: &str = "alzdetect_results";

/// Issues `<unix-millis>-<sequence>` ids that keep increasing even when
/// several appends land in the same millisecond or the clock steps back.
#[derive(Debug, Default)]
struct IdIssuer {
    last: Option<(i64, u32)>,
}

impl IdIssuer {
    fn observe(&mut self, id: &str) {
        if let Some(parsed) = parse_record_id(id) {
            if self.last.map_or(true, |last| parsed > last) {
                self.last = Some(parsed);
            }
        }
    }

    fn issue(&mut self, now_millis: i64) -> String {
        let next = match self.last {
            Some((millis, sequence)) if now_millis <= millis => (millis, sequence + 1),
            _ => (now_millis, 0),
        };
        self.last = Some(next);
        format!("{}-{}", next.0, next.1)
    }
}

/// Splits a record id into `(millis, sequence)`. Bare millisecond ids are
/// read as sequence 0.
pub fn parse_record_id(id: &str) -> Option<(i64, u32)> {
    match id.split_once('-') {
        Some((millis, sequence)) => Some((millis.parse().ok()?, sequence.parse().ok()?)),
        None => Some((id.parse().ok()?, 0)),
    }
}

/// Append-only history of analyses on top of a [`SlotStorage`].
///
/// Nothing is cached: every read goes back to the storage so a change made by
/// another view or process is always visible. Each mutation writes the whole
/// sequence and bumps the revision published by [`ResultStore::subscribe`].
pub struct ResultStore {
    storage: Arc<dyn SlotStorage>,
    ids: Mutex<IdIssuer>,
    revision: watch::Sender<u64>,
    tolerance: f64,
}

impl ResultStore {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            storage,
            ids: Mutex::new(IdIssuer::default()),
            revision,
            tolerance: DEFAULT_PROBABILITY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn append(
        &self,
        outcome: AnalysisOutcome,
        file_name: &str,
    ) -> Result<StoredRecord, RecordError> {
        self.append_at(outcome, file_name, Utc::now())
    }

    pub(crate) fn append_at(
        &self,
        outcome: AnalysisOutcome,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredRecord, RecordError> {
        outcome.class_probabilities.validate(self.tolerance)?;
        if let Some(warning) = outcome.integrity_warning() {
            warn!("Storing result for {file_name} with integrity warning: {warning}");
        }

        // Held across read-modify-write so appends never interleave.
        let mut ids = self.lock_ids();

        let mut records = self.load()?;
        if let Some(newest) = records.first() {
            ids.observe(&newest.id);
        }

        let record = StoredRecord::new(
            ids.issue(now.timestamp_millis()),
            now,
            file_name.to_string(),
            outcome,
        );
        records.insert(0, record.clone());
        self.persist(&records)?;
        drop(ids);

        self.revision.send_modify(|revision| *revision += 1);
        info!(
            "Stored result {} for {} ({})",
            record.id, record.file_name, record.predicted_class
        );

        Ok(record)
    }

    /// All records, newest first.
    pub fn list(&self) -> Result<Vec<StoredRecord>, RecordError> {
        self.load()
    }

    pub fn clear(&self) -> Result<(), RecordError> {
        let _ids = self.lock_ids();
        self.storage
            .remove(RESULTS_SLOT)
            .map_err(|err| {
                error!("Failed to clear stored results: {err:#}");
                RecordError::PersistenceUnavailable(err)
            })?;

        self.revision.send_modify(|revision| *revision += 1);
        info!("Cleared stored results");
        Ok(())
    }

    /// Revision counter that moves on every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Called by the host when the underlying storage was changed by someone
    /// else, so subscribed views re-read.
    pub fn notify_external_change(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn lock_ids(&self) -> MutexGuard<'_, IdIssuer> {
        match self.ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn load(&self) -> Result<Vec<StoredRecord>, RecordError> {
        let raw = self
            .storage
            .read(RESULTS_SLOT)
            .map_err(RecordError::PersistenceUnavailable)?;

        match raw {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .context("stored results are not a valid record list")
                .map_err(RecordError::PersistenceUnavailable),
        }
    }

    fn persist(&self, records: &[StoredRecord]) -> Result<(), RecordError> {
        let serialized = serde_json::to_string(records)
            .context("failed to serialize results")
            .map_err(RecordError::PersistenceUnavailable)?;

        self.storage
            .write(RESULTS_SLOT, &serialized)
            .map_err(|err| {
                error!("Failed to persist results: {err:#}");
                RecordError::PersistenceUnavailable(err)
            })
    }
}
