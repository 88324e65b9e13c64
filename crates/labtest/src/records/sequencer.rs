//! Id allocation and record persistence.
//!
//! Both collections draw from one id sequence: the next id is always one past
//! the larger of the two stored counters, so a concrete record and a soil
//! record can never share an id. Only the counter of the collection being
//! written is advanced.
//!
//! Every operation is a sequence of awaited reads followed by a single write.
//! Nothing is held across that gap, so two writers working on the same store at
//! the same time can be handed the same ids. The sequencer assumes one writer.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{Collection, IdRange, TestRecord};
use crate::calc::Fields;
use crate::error::{Result, StorageError, ValidationError};
use crate::storage::KeyValueStore;

/// Assigns ids and appends records over a [`KeyValueStore`].
#[derive(Debug)]
pub struct RecordSequencer<S> {
    store: S,
}

impl<S: KeyValueStore> RecordSequencer<S> {
    /// Create a sequencer over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last id assigned in `collection`, 0 if none.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the counter is not a number.
    pub async fn counter(&self, collection: Collection) -> Result<u64, StorageError> {
        let key = collection.counter_key();
        match self.store.get(key).await? {
            None => Ok(0),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| StorageError::InvalidCounter {
                    key: key.to_string(),
                    value: raw,
                }),
        }
    }

    /// All records of `collection`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored array is corrupt.
    pub async fn records(&self, collection: Collection) -> Result<Vec<TestRecord>, StorageError> {
        let key = collection.records_key();
        match self.store.get(key).await? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Reserve `count` consecutive ids for `collection`.
    ///
    /// Advances the collection's counter to the last reserved id. The other
    /// collection's counter is read but never written.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `count` is zero, or a storage error if
    /// the counters cannot be read or written.
    pub async fn allocate_ids(&self, collection: Collection, count: u64) -> Result<IdRange> {
        let range = self.reserve(count).await?;
        self.store
            .set(collection.counter_key(), &range.end().to_string())
            .await
            .map_err(|err| {
                warn!("Failed to advance {} counter: {}", collection, err);
                err
            })?;

        debug!("Allocated ids {} for {}", range, collection);
        Ok(range)
    }

    /// Append `new` to the stored records of `collection`.
    ///
    /// Existing records keep their order; `new` is added at the end as given.
    /// Every id must already have been handed out by [`allocate_ids`](Self::allocate_ids)
    /// and must not be in use in either collection.
    ///
    /// # Errors
    ///
    /// Returns a validation error on field `id` for an unallocated or
    /// duplicate id, or a storage error if the store fails.
    pub async fn append_records(
        &self,
        collection: Collection,
        new: Vec<TestRecord>,
    ) -> Result<()> {
        if new.is_empty() {
            return Ok(());
        }

        let issued = self.highest_issued().await?;
        let mut stored = self.records(collection).await?;
        let mut taken: HashSet<u64> = stored.iter().map(|r| r.id).collect();
        for other in Collection::ALL.into_iter().filter(|c| *c != collection) {
            taken.extend(self.records(other).await?.iter().map(|r| r.id));
        }

        for record in &new {
            if record.id == 0 || record.id > issued {
                return Err(ValidationError::new(
                    "id",
                    format!("id {} has not been allocated", record.id),
                )
                .into());
            }
            if !taken.insert(record.id) {
                return Err(
                    ValidationError::new("id", format!("id {} is already in use", record.id))
                        .into(),
                );
            }
        }

        let added = new.len();
        stored.extend(new);
        self.store
            .set(collection.records_key(), &encode(collection.records_key(), &stored)?)
            .await
            .map_err(|err| {
                warn!("Failed to save {} records: {}", collection, err);
                err
            })?;

        debug!("Appended {} {} records", added, collection);
        Ok(())
    }

    /// Save `count` copies of a form as new records.
    ///
    /// The copies receive consecutive ids. The extended collection and its
    /// advanced counter are written in one batch, so either both are stored
    /// or neither is.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `count` is zero, or a storage error if
    /// the store fails.
    pub async fn register(
        &self,
        collection: Collection,
        fields: &Fields,
        count: u64,
    ) -> Result<Vec<TestRecord>> {
        let range = self.reserve(count).await?;
        let created: Vec<TestRecord> = range.ids().map(|id| TestRecord::new(id, fields)).collect();

        let mut stored = self.records(collection).await?;
        stored.extend(created.iter().cloned());

        let entries = [
            (
                collection.records_key().to_string(),
                encode(collection.records_key(), &stored)?,
            ),
            (
                collection.counter_key().to_string(),
                range.end().to_string(),
            ),
        ];

        if let Err(err) = self.store.set_many(&entries).await {
            warn!("Failed to register {} record: {}", collection, err);
            return Err(err.into());
        }

        info!("Registered {} record(s) with id {}", collection, range);
        Ok(created)
    }

    /// Delete every record and reset both counters to 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; in that case nothing is deleted.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        let keys: Vec<&str> = Collection::ALL
            .iter()
            .flat_map(|c| [c.records_key(), c.counter_key()])
            .collect();

        self.store.remove_many(&keys).await.map_err(|err| {
            warn!("Failed to clear records: {}", err);
            err
        })?;

        info!("Cleared all records and counters");
        Ok(())
    }

    /// The larger of the two counters.
    async fn highest_issued(&self) -> Result<u64, StorageError> {
        let mut highest = 0;
        for collection in Collection::ALL {
            highest = highest.max(self.counter(collection).await?);
        }
        Ok(highest)
    }

    /// Compute the next block of `count` ids without writing anything.
    async fn reserve(&self, count: u64) -> Result<IdRange> {
        if count == 0 {
            return Err(ValidationError::new("count", "at least one id must be requested").into());
        }

        let range = self
            .highest_issued()
            .await?
            .checked_add(1)
            .and_then(|start| IdRange::new(start, count))
            .ok_or_else(|| ValidationError::new("count", "id sequence exhausted"))?;

        Ok(range)
    }
}

fn encode(key: &str, records: &[TestRecord]) -> Result<String, StorageError> {
    serde_json::to_string(records).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}
