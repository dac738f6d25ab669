// SomnoWatch — Persistent Log Store
//
// Append-only queue of sample records in a flash-backed text file.
// Survives power loss; insertion order is chronological order. The one
// atomicity rule: the file is cleared only after the collector has
// confirmed delivery of the whole batch.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::error::Result;
use crate::record::SampleRecord;

/// Delivery endpoint for drained batches (the remote collector).
/// `deliver` must only return `Ok` when the entire batch was accepted;
/// anything partial counts as failure.
pub trait SampleSink {
    fn deliver(&mut self, batch: &[SampleRecord]) -> Result<()>;
}

pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Durably append one record. Called once per wake, indefinitely.
    pub fn append(&self, record: &SampleRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record.to_line())?;
        // Power can drop the moment we sleep; flush through the page cache.
        file.sync_all()?;
        Ok(())
    }

    /// All persisted records in insertion order. A missing file is an
    /// empty store; malformed lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<SampleRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match SampleRecord::from_line(line) {
                Ok(rec) => records.push(rec),
                Err(e) => log::warn!("skipping corrupt log line: {e}"),
            }
        }
        Ok(records)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    /// Hand the full ordered batch to `sink`, and clear the store only
    /// if delivery reports success. On failure the file is untouched so
    /// the next eligible wake retries the same batch.
    pub fn drain_and_clear(&self, sink: &mut dyn SampleSink) -> Result<usize> {
        let records = self.read_all()?;
        if records.is_empty() {
            return Ok(0);
        }
        sink.deliver(&records)?;
        fs::write(&self.path, "")?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::fakes::{sample_at, RecordingSink};

    fn temp_store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("samples.csv"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn append_then_read_preserves_order_and_values() {
        let (_dir, store) = temp_store();
        let records: Vec<_> = (0..5).map(|i| sample_at(3, i as u8 * 10, 0)).collect();
        for rec in &records {
            store.append(rec).unwrap();
        }
        assert_eq!(store.read_all().unwrap(), records);
    }

    #[test]
    fn drain_clears_only_on_confirmed_delivery() {
        let (_dir, store) = temp_store();
        for minute in 0..3 {
            store.append(&sample_at(4, minute, 0)).unwrap();
        }

        let mut failing = RecordingSink::failing();
        assert!(matches!(
            store.drain_and_clear(&mut failing),
            Err(Fault::Delivery(_))
        ));
        assert_eq!(store.len().unwrap(), 3, "store must survive delivery failure");

        let mut sink = RecordingSink::accepting();
        assert_eq!(store.drain_and_clear(&mut sink).unwrap(), 3);
        assert_eq!(store.len().unwrap(), 0);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0].len(), 3);
    }

    #[test]
    fn drain_of_empty_store_is_a_noop() {
        let (_dir, store) = temp_store();
        let mut sink = RecordingSink::accepting();
        assert_eq!(store.drain_and_clear(&mut sink).unwrap(), 0);
        assert!(sink.batches.is_empty(), "no empty batches on the wire");
    }

    #[test]
    fn corrupt_lines_are_skipped_not_fatal() {
        let (_dir, store) = temp_store();
        store.append(&sample_at(2, 0, 0)).unwrap();
        // Simulate a torn write from a power cut mid-append.
        std::fs::OpenOptions::new()
            .append(true)
            .open(store.path.clone())
            .unwrap()
            .write_all(b"02:30:0")
            .unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }
}
