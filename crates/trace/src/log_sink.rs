use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{TraceError, TraceHook, MAX_RECORD_LEN};

/// One captured record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub id: u8,
    pub payload: Vec<u8>,
    pub timestamp: bool,
}

/// In-memory sink, mostly useful for tests and post-mortem dumps.
#[derive(Clone, Default)]
pub struct RecordLog {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook appending to this log.
    pub fn hook(&self) -> TraceHook {
        let records = Arc::clone(&self.records);
        Arc::new(move |id, payload, timestamp| {
            if payload.len() > MAX_RECORD_LEN {
                return Err(TraceError::PayloadTooLarge(payload.len()));
            }
            records.lock().push(TraceRecord {
                id,
                payload: payload.to_vec(),
                timestamp,
            });
            Ok(())
        })
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn ids(&self) -> Vec<u8> {
        self.records.lock().iter().map(|record| record.id).collect()
    }

    pub fn count(&self, id: u8) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.id == id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}
