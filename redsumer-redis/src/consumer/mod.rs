mod dead_letter;
mod filter;
mod lifecycle;
mod options;

pub use dead_letter::*;
pub use filter::*;
pub use lifecycle::*;
pub use options::*;

use std::time::Duration;

use crate::{default_consumer_id, RedisStore};
use redsumer_runtime::timeout;
use redsumer_types::{
    ConsumerGroupHandle, EntryId, GroupCreated, IdBound, PendingQuery, PendingRecord, StreamEntry,
    StreamErr, StreamKey, StreamResult, StreamStore,
};

pub mod constants {
    use std::time::Duration;

    pub const DEFAULT_BATCH_SIZE: usize = 100;
    pub const DEFAULT_BLOCK: Duration = Duration::from_secs(1);
    /// Waits in seconds, doubling.
    pub const DEFAULT_RETRY_SCHEDULE: [u64; 5] = [1, 2, 4, 8, 16];
    pub const DEFAULT_DEAD_LETTER_THRESHOLD: Duration = Duration::from_secs(3600);
    /// Entries idle for less than this are never considered for dead-lettering,
    /// whatever the policy.
    pub const DEAD_LETTER_MIN_IDLE: Duration = Duration::from_secs(10);
    pub const DEAD_LETTER_PREFIX: &str = "dead:letters:";
    /// How many times a single consume call may re-create a missing group.
    pub const MAX_GROUP_RECOVERY: usize = 1;
}

pub use constants::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// The sources a consume call fetches from, in order.
pub enum Tier {
    /// Entries never delivered to any consumer of the group.
    New,
    /// Entries delivered to this consumer and not yet acknowledged.
    Pending,
    /// Entries abandoned by other consumers.
    AutoClaim,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::New, Tier::Pending, Tier::AutoClaim];
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
/// The client-side read positions of a consumer.
pub struct Cursor {
    /// Id of the last entry returned by the pending tier; the next scan starts after it.
    pub last_pending_id: EntryId,
    /// Where the next auto-claim scan starts.
    pub next_auto_claim_id: EntryId,
}

#[derive(Debug)]
/// A member of a consumer group, fetching entries from the [`Tier`]s in order.
///
/// At-least-once delivery: every entry returned must eventually be acknowledged with
/// [`GroupConsumer::ack`]; until then it stays pending and may be re-delivered.
pub struct GroupConsumer<S: StreamStore = RedisStore> {
    store: S,
    handle: ConsumerGroupHandle,
    options: RedisConsumerOptions,
    cursor: Cursor,
}

impl<S: StreamStore> GroupConsumer<S> {
    /// This does not talk to the store. Call [`GroupConsumer::ensure_group`] before consuming,
    /// or let the first consume call create the group.
    pub fn new(store: S, stream: StreamKey, options: RedisConsumerOptions) -> Self {
        let consumer = options
            .consumer_id()
            .cloned()
            .unwrap_or_else(default_consumer_id);
        let handle = ConsumerGroupHandle::new(stream, options.group().clone(), consumer);
        Self {
            store,
            handle,
            options,
            cursor: Cursor::default(),
        }
    }

    pub fn handle(&self) -> &ConsumerGroupHandle {
        &self.handle
    }

    pub fn stream(&self) -> &StreamKey {
        self.handle.stream()
    }

    pub fn options(&self) -> &RedisConsumerOptions {
        &self.options
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn is_enabled(&self, tier: Tier) -> bool {
        match tier {
            Tier::New => true,
            Tier::Pending => matches!(self.options.pending(), PendingTier::Enabled { .. }),
            Tier::AutoClaim => matches!(self.options.auto_claim(), AutoClaimTier::Enabled { .. }),
        }
    }

    /// Fetch the next batch of entries.
    ///
    /// Returns the first non-empty result among the enabled tiers, or an empty list if
    /// there is nothing to do. If the group turns out to be missing, it is re-created and
    /// the tier retried, at most [`MAX_GROUP_RECOVERY`] times per call. Any other error
    /// is returned as is.
    pub async fn consume(&mut self) -> StreamResult<Vec<StreamEntry>, S::Error> {
        let mut recoveries = 0;
        for tier in Tier::ALL {
            if !self.is_enabled(tier) {
                continue;
            }
            let entries = self.fetch_with_recovery(tier, &mut recoveries).await?;
            if !entries.is_empty() {
                log::trace!("{} got {} entries from {tier:?}", self.handle, entries.len());
                return Ok(entries);
            }
        }
        Ok(Vec::new())
    }

    /// Like [`GroupConsumer::consume`], but gives up after `dur`.
    ///
    /// Cursors are only advanced after a fetch completes, so a call cut short
    /// leaves them as they were.
    pub async fn consume_timeout(
        &mut self,
        dur: Duration,
    ) -> StreamResult<Vec<StreamEntry>, S::Error> {
        match timeout(dur, self.consume()).await {
            Ok(res) => res,
            Err(_) => Err(StreamErr::Timeout),
        }
    }

    async fn fetch_with_recovery(
        &mut self,
        tier: Tier,
        recoveries: &mut usize,
    ) -> StreamResult<Vec<StreamEntry>, S::Error> {
        for attempt in 0..MAX_GROUP_RECOVERY {
            if *recoveries >= MAX_GROUP_RECOVERY {
                break;
            }
            match self.fetch(tier).await {
                Err(err) if err.is_group_missing() => {
                    log::warn!(
                        "{}: {err} (attempt {}); re-creating the group",
                        self.handle,
                        attempt + 1
                    );
                    *recoveries += 1;
                    self.ensure_group().await?;
                }
                res => return res,
            }
        }
        // recovery budget used up: whatever happens now is final
        self.fetch(tier).await
    }

    async fn fetch(&mut self, tier: Tier) -> StreamResult<Vec<StreamEntry>, S::Error> {
        match tier {
            Tier::New => {
                self.store
                    .read_group_new(&self.handle, self.options.batch_size(), self.options.block())
                    .await
            }
            Tier::Pending => {
                let batch_size = match self.options.pending() {
                    PendingTier::Enabled { batch_size } => *batch_size,
                    PendingTier::Disabled => return Ok(Vec::new()),
                };
                let entries = self
                    .store
                    .read_group_from(&self.handle, self.cursor.last_pending_id, batch_size)
                    .await?;
                // wrap around once the scan is complete
                self.cursor.last_pending_id = match entries.last() {
                    Some(entry) => *entry.id(),
                    None => EntryId::ORIGIN,
                };
                Ok(entries)
            }
            Tier::AutoClaim => {
                let (batch_size, min_idle) = match self.options.auto_claim() {
                    AutoClaimTier::Enabled {
                        batch_size,
                        min_idle,
                    } => (*batch_size, *min_idle),
                    AutoClaimTier::Disabled => return Ok(Vec::new()),
                };
                let reply = self
                    .store
                    .auto_claim(
                        &self.handle,
                        min_idle,
                        self.cursor.next_auto_claim_id,
                        batch_size,
                    )
                    .await?;
                self.cursor.next_auto_claim_id = reply.next;
                Ok(reply.entries)
            }
        }
    }

    /// Acknowledge entries, removing them from the pending list.
    ///
    /// Fails with [`StreamErr::NoAckedMessage`] if none of them was pending,
    /// e.g. because they had already been acknowledged, or claimed by another consumer
    /// that acknowledged them.
    pub async fn ack(&mut self, ids: &[EntryId]) -> StreamResult<usize, S::Error> {
        let acked = self.store.ack(&self.handle, ids).await?;
        if acked == 0 {
            return Err(StreamErr::NoAckedMessage);
        }
        if acked < ids.len() {
            log::debug!(
                "{}: only {acked} of {} entries were acknowledged",
                self.handle,
                ids.len()
            );
        }
        Ok(acked)
    }

    /// The pending record of an entry owned by this consumer.
    pub async fn pending_record(&mut self, id: EntryId) -> StreamResult<PendingRecord, S::Error> {
        self.own_pending(id, Duration::ZERO)
            .await?
            .ok_or_else(|| StreamErr::KeyNotFound(id.to_string()))
    }

    /// Whether the entry is still pending for this consumer, with an idle time of at least
    /// [`RedisConsumerOptions::still_mine_idle`]. Useful for a slow worker to check that the
    /// entry has not been claimed by someone else before committing its side effects.
    pub async fn still_mine(&mut self, id: EntryId) -> StreamResult<bool, S::Error> {
        let min_idle = self.options.still_mine_idle();
        Ok(self.own_pending(id, min_idle).await?.is_some())
    }

    async fn own_pending(
        &mut self,
        id: EntryId,
        min_idle: Duration,
    ) -> StreamResult<Option<PendingRecord>, S::Error> {
        let query = PendingQuery::new()
            .consumer(self.handle.consumer().clone())
            .min_idle(min_idle)
            .range(IdBound::At(id), IdBound::At(id))
            .count(Some(1));
        let records = self.store.pending(&self.handle, &query).await?;
        Ok(records.into_iter().find(|r| r.id() == &id))
    }

    /// Create the group, delivering entries after `start`.
    /// Unlike [`GroupConsumer::ensure_group`], an existing group is an error:
    /// [`StreamErr::GroupExists`].
    pub async fn create_group(&mut self, start: EntryId) -> StreamResult<(), S::Error> {
        match self.store.create_group(&self.handle, start).await? {
            GroupCreated::Created => {
                log::info!("Created consumer group {} at {start}", self.handle);
                Ok(())
            }
            GroupCreated::AlreadyExists => Err(StreamErr::GroupExists(self.handle.to_string())),
        }
    }

    /// The dead-letter stream of this consumer.
    pub fn dead_letter_stream(&self) -> StreamResult<StreamKey, S::Error> {
        match self.options.dead_letter_stream() {
            Some(stream) => Ok(stream.clone()),
            None => Ok(StreamKey::new(format!(
                "{DEAD_LETTER_PREFIX}{}",
                self.handle.stream()
            ))?),
        }
    }
}
