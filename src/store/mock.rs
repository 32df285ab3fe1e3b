//! In-memory store for unit testing.
//!
//! Records every operation and can be told to fail reads or writes, so tests
//! can check that callers keep their state consistent when storage fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use pf::store::mock::{MockStore, StoreOperation};
//!
//! let store = MockStore::new();
//! store.put(&record).await?;
//! store.fail_writes(true);
//! assert!(store.delete(record.id).await.is_err());
//! store.assert_operations(&[StoreOperation::Put { id: record.id }]);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use super::ImageStore;
use crate::error::{FrameError, Result};
use crate::record::ImageRecord;

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Put { id: i64 },
    PutAll { ids: Vec<i64> },
    GetAll,
    Delete { id: i64 },
}

/// Mock store holding records in a `BTreeMap`.
///
/// Only successful operations are logged.
#[derive(Default)]
pub struct MockStore {
    records: Mutex<BTreeMap<i64, ImageRecord>>,
    operation_log: Mutex<Vec<StoreOperation>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MockStore {
    /// Create an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        let store = Self::new();
        store
            .records()
            .extend(records.into_iter().map(|r| (r.id, r)));
        store
    }

    // === Failure Injection ===

    /// Make every subsequent write fail until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail until switched off.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    // === Assertions ===

    /// Snapshot of the stored records, ascending by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.records().values().cloned().collect()
    }

    /// Stored ids, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        self.records().keys().copied().collect()
    }

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.log().clone()
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.log().clear();
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[StoreOperation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    // === Internal Helpers ===

    fn records(&self) -> MutexGuard<'_, BTreeMap<i64, ImageRecord>> {
        self.records.lock().expect("mock store lock poisoned")
    }

    fn log(&self) -> MutexGuard<'_, Vec<StoreOperation>> {
        self.operation_log.lock().expect("mock store log poisoned")
    }

    fn record_op(&self, op: StoreOperation) {
        trace!(?op, "Recording store operation");
        self.log().push(op);
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FrameError::StorageUnavailable(
                "mock store configured to fail writes".to_string(),
            ));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(FrameError::StorageUnavailable(
                "mock store configured to fail reads".to_string(),
            ));
        }
        Ok(())
    }
}

impl ImageStore for MockStore {
    async fn put(&self, record: &ImageRecord) -> Result<()> {
        self.check_write()?;
        self.records().insert(record.id, record.clone());
        self.record_op(StoreOperation::Put { id: record.id });
        Ok(())
    }

    async fn put_all(&self, records: &[ImageRecord]) -> Result<()> {
        self.check_write()?;

        let mut replacement = BTreeMap::new();
        for record in records {
            if replacement.insert(record.id, record.clone()).is_some() {
                return Err(FrameError::StorageUnavailable(format!(
                    "duplicate id {} in bulk replacement",
                    record.id
                )));
            }
        }

        *self.records() = replacement;
        self.record_op(StoreOperation::PutAll {
            ids: records.iter().map(|r| r.id).collect(),
        });
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ImageRecord>> {
        self.check_read()?;
        // Newest first, so callers cannot rely on the store for ordering.
        let records = self.records().values().rev().cloned().collect();
        self.record_op(StoreOperation::GetAll);
        Ok(records)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check_write()?;
        self.records().remove(&id);
        self.record_op(StoreOperation::Delete { id });
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.check_read()?;
        Ok(self.records().len())
    }
}
