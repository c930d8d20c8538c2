use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::MetadataRecord;

use crate::config::SlotRead;

/// Holds the most recent metadata record of one output stream.
///
/// Writers replace the value, readers see either the previous or the newest record. A record
/// that is replaced before anyone reads it is gone.
#[derive(Debug, Default)]
pub struct LatestMetadata {
    latest: Mutex<Option<Arc<MetadataRecord>>>,
}

impl LatestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, record: MetadataRecord) {
        let record = Arc::new(record);
        *self.lock() = Some(record);
    }

    pub fn get(&self) -> Option<Arc<MetadataRecord>> {
        self.lock().clone()
    }

    pub fn take(&self) -> Option<Arc<MetadataRecord>> {
        self.lock().take()
    }

    pub fn read(&self, policy: SlotRead) -> Option<Arc<MetadataRecord>> {
        match policy {
            SlotRead::Keep => self.get(),
            SlotRead::Take => self.take(),
        }
    }

    // The guarded value is a single pointer swap, so a writer that panicked cannot leave it
    // half written.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<MetadataRecord>>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
