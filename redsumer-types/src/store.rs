use std::{fmt::Display, time::Duration};

use crate::{
    ConsumerGroupHandle, ConsumerId, EntryId, PendingRecord, StreamEntry, StreamKey, StreamResult,
};
use async_trait::async_trait;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Outcome of a group creation request.
pub enum GroupCreated {
    Created,
    /// The group was already there. Creation is idempotent, so this is not an error.
    AlreadyExists,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// One end of an id range.
pub enum IdBound {
    /// `-`, the smallest possible id
    Min,
    /// `+`, the greatest possible id
    Max,
    /// Inclusive
    At(EntryId),
    /// Exclusive
    After(EntryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Query over the pending entries of a group.
pub struct PendingQuery {
    consumer: Option<ConsumerId>,
    min_idle: Duration,
    start: IdBound,
    end: IdBound,
    count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reply of an auto-claim scan.
pub struct AutoClaimReply {
    /// Where the next scan should start. [`EntryId::ORIGIN`] when the scan has wrapped around.
    pub next: EntryId,
    /// Entries whose ownership has been transferred to the claiming consumer.
    pub entries: Vec<StreamEntry>,
}

#[async_trait]
/// The store operations the consumer-group engine is built upon.
///
/// Implementations should report a missing consumer group as [`crate::StreamErr::GroupNotFound`],
/// which the engine recovers from by re-creating the group. All other errors are passed
/// through to the caller unchanged.
pub trait StreamStore: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the stream key exists.
    async fn exists(&mut self, key: &StreamKey) -> StreamResult<bool, Self::Error>;

    /// Create the consumer group, delivering entries after `start`.
    async fn create_group(
        &mut self,
        handle: &ConsumerGroupHandle,
        start: EntryId,
    ) -> StreamResult<GroupCreated, Self::Error>;

    /// Read up to `count` entries never delivered to any consumer of the group.
    /// If `block` is set, wait up to that long for entries to arrive.
    /// Returns an empty list if nothing arrived in time.
    async fn read_group_new(
        &mut self,
        handle: &ConsumerGroupHandle,
        count: usize,
        block: Option<Duration>,
    ) -> StreamResult<Vec<StreamEntry>, Self::Error>;

    /// Read up to `count` entries delivered to this consumer and not yet acknowledged,
    /// with id greater than `from`.
    async fn read_group_from(
        &mut self,
        handle: &ConsumerGroupHandle,
        from: EntryId,
        count: usize,
    ) -> StreamResult<Vec<StreamEntry>, Self::Error>;

    /// List pending entries of the group.
    async fn pending(
        &mut self,
        handle: &ConsumerGroupHandle,
        query: &PendingQuery,
    ) -> StreamResult<Vec<PendingRecord>, Self::Error>;

    /// Transfer ownership of the given entries to this consumer, if they have been idle for
    /// at least `min_idle`. Returns the entries actually claimed.
    async fn claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> StreamResult<Vec<StreamEntry>, Self::Error>;

    /// Scan the pending entries of the whole group starting from `start`,
    /// and claim up to `count` of those idle for at least `min_idle`.
    async fn auto_claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        start: EntryId,
        count: usize,
    ) -> StreamResult<AutoClaimReply, Self::Error>;

    /// Acknowledge entries. Returns the number of entries actually acknowledged.
    async fn ack(
        &mut self,
        handle: &ConsumerGroupHandle,
        ids: &[EntryId],
    ) -> StreamResult<usize, Self::Error>;

    /// Append an entry to the stream, returning the id assigned by the store.
    async fn append(
        &mut self,
        stream: &StreamKey,
        fields: &[(String, String)],
    ) -> StreamResult<EntryId, Self::Error>;
}

impl PendingQuery {
    /// All pending entries of the group, from `-` to `+`, with no count limit.
    pub fn new() -> Self {
        Self {
            consumer: None,
            min_idle: Duration::ZERO,
            start: IdBound::Min,
            end: IdBound::Max,
            count: None,
        }
    }

    /// Restrict to entries owned by this consumer.
    pub fn consumer(mut self, consumer: ConsumerId) -> Self {
        self.consumer = Some(consumer);
        self
    }

    pub fn min_idle(mut self, min_idle: Duration) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn range(mut self, start: IdBound, end: IdBound) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// `None` means unbounded.
    pub fn count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn get_consumer(&self) -> Option<&ConsumerId> {
        self.consumer.as_ref()
    }

    pub fn get_min_idle(&self) -> Duration {
        self.min_idle
    }

    pub fn get_start(&self) -> IdBound {
        self.start
    }

    pub fn get_end(&self) -> IdBound {
        self.end
    }

    pub fn get_count(&self) -> Option<usize> {
        self.count
    }
}

impl Default for PendingQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl IdBound {
    /// Whether `id` lies on the inner side of this bound, used as a start bound.
    pub fn admits_from(&self, id: &EntryId) -> bool {
        match self {
            Self::Min => true,
            Self::Max => false,
            Self::At(bound) => id >= bound,
            Self::After(bound) => id > bound,
        }
    }

    /// Whether `id` lies on the inner side of this bound, used as an end bound.
    pub fn admits_until(&self, id: &EntryId) -> bool {
        match self {
            Self::Min => false,
            Self::Max => true,
            Self::At(bound) => id <= bound,
            Self::After(bound) => id < bound,
        }
    }
}

impl Display for IdBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Min => write!(f, "-"),
            Self::Max => write!(f, "+"),
            Self::At(id) => write!(f, "{id}"),
            Self::After(id) => write!(f, "({id}"),
        }
    }
}
