//! Record lookup.
//!
//! Storage itself is out of scope for this crate; callers supply a
//! [`RecordStore`]. [`MemoryRecordStore`] backs the CLI and tests.

use crate::record::ConnectionRecord;
use crate::{DataVizError, Result};
use async_trait::async_trait;

/// Finds an entity by id using the caller's id accessor.
pub fn find_by_id<T, F>(entities: &[T], id: i64, id_of: F) -> Option<&T>
where
    F: Fn(&T) -> Option<i64>,
{
    entities.iter().find(|entity| id_of(entity) == Some(id))
}

/// Source of persisted connection records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the record with the given id, if any.
    ///
    /// # Errors
    /// Returns an error only if the backing store fails.
    async fn find_by_id(&self, id: i64) -> Result<Option<ConnectionRecord>>;
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<ConnectionRecord>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, assigning the next free id if it has none.
    ///
    /// Returns the record's id.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] if no id is left above the
    /// highest stored one.
    pub fn insert(&mut self, mut record: ConnectionRecord) -> Result<i64> {
        let id = match record.id {
            Some(id) => id,
            None => self
                .records
                .iter()
                .filter_map(|r| r.id)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(|| DataVizError::configuration("Record id space exhausted"))?,
        };
        record.id = Some(id);
        self.records.retain(|existing| existing.id != Some(id));
        self.records.push(record);
        Ok(id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<ConnectionRecord>> {
        Ok(find_by_id(&self.records, id, |record| record.id).cloned())
    }
}
