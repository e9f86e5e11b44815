use crate::record::LogRecord;
use std::sync::Mutex;

/// Thread-safe pending-record buffer shared between producer threads and the
/// flush task.
///
/// Producers only ever append; the flush task periodically takes everything
/// currently buffered in one atomic swap. Appending never performs I/O and
/// never blocks beyond the internal lock.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    inner: Mutex<Vec<LogRecord>>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: LogRecord) {
        self.inner.lock().expect("lock poisoned").push(record);
    }

    /// Take every record appended so far and leave the buffer empty.
    ///
    /// Atomic with respect to concurrent appends: a record is returned by
    /// exactly one drain call, never lost and never duplicated.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.inner.lock().expect("lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
