use std::time::Duration;

use crate::{ConsumerId, EntryId, Timestamp};

/// The field-value pairs of an entry, in the order they were appended.
pub type Fields = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// An entry of a stream. Immutable once appended.
pub struct StreamEntry {
    id: EntryId,
    fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Metadata of an entry that has been delivered to a consumer but not yet acknowledged.
///
/// This is a snapshot: it is queried fresh from the store and should not be kept
/// beyond one filtering pass.
pub struct PendingRecord {
    id: EntryId,
    owner: ConsumerId,
    idle: Duration,
    delivery_count: u64,
}

impl StreamEntry {
    pub fn new(id: EntryId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Value of the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn timestamp(&self) -> Timestamp {
        self.id.timestamp()
    }
}

impl PendingRecord {
    pub fn new(id: EntryId, owner: ConsumerId, idle: Duration, delivery_count: u64) -> Self {
        Self {
            id,
            owner,
            idle,
            delivery_count,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    /// The consumer currently owning this entry.
    pub fn owner(&self) -> &ConsumerId {
        &self.owner
    }

    /// Time elapsed since the entry was last delivered.
    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Number of times the entry has been delivered.
    pub fn delivery_count(&self) -> u64 {
        self.delivery_count
    }
}
