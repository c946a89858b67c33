use redsumer_redis::{
    AutoClaimReply, ConsumerGroup, ConsumerGroupHandle, ConsumerId, EntryId, Fields,
    GroupConsumer, GroupCreated, PendingQuery, PendingRecord, RedisConsumerOptions,
    RetrySchedule, StreamEntry, StreamErr, StreamKey, StreamResult, StreamStore,
};
use redsumer_redis::export::async_trait;
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

static INIT: std::sync::Once = std::sync::Once::new();

#[allow(dead_code)]
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MockErr(pub String);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Op {
    Exists,
    CreateGroup,
    ReadNew,
    ReadFrom,
    Pending,
    Claim,
    AutoClaim,
    Ack,
    Append,
}

#[derive(Debug, Clone)]
/// An error to be returned by the next call of an operation.
pub enum Fault {
    GroupMissing,
    Backend(String),
}

#[derive(Debug, Clone)]
struct Delivery {
    owner: ConsumerId,
    delivered_at: Duration,
    count: u64,
}

#[derive(Debug, Default)]
struct Group {
    last_delivered: EntryId,
    pel: BTreeMap<EntryId, Delivery>,
}

#[derive(Debug, Default)]
struct State {
    clock: Duration,
    last_millis: u64,
    streams: HashMap<StreamKey, Vec<StreamEntry>>,
    groups: HashMap<(StreamKey, ConsumerGroup), Group>,
    calls: Vec<Op>,
    faults: VecDeque<(Op, Fault)>,
    hidden_checks: usize,
    ack_on_append: Option<(StreamKey, ConsumerGroup, EntryId)>,
}

#[derive(Debug, Clone, Default)]
/// An in-memory stream store with consumer groups, following the semantics of Redis Streams.
/// Clones share the same state, so several consumers can work on the same store.
///
/// Time does not pass on its own: call [`MemoryStore::advance`].
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn advance(&self, d: Duration) {
        self.lock().clock += d;
    }

    /// Append an entry without going through the store interface.
    pub fn push(&self, stream: &StreamKey, fields: &[(&str, &str)]) -> EntryId {
        let fields = fields
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect();
        self.lock().append(stream, fields)
    }

    pub fn entries(&self, stream: &StreamKey) -> Vec<StreamEntry> {
        self.lock().streams.get(stream).cloned().unwrap_or_default()
    }

    /// Make the next `n` existence checks fail, whether the stream exists or not.
    pub fn hide_stream_for(&self, n: usize) {
        self.lock().hidden_checks = n;
    }

    pub fn drop_group(&self, stream: &StreamKey, group: &ConsumerGroup) {
        self.lock()
            .groups
            .remove(&(stream.clone(), group.clone()));
    }

    pub fn has_group(&self, stream: &StreamKey, group: &ConsumerGroup) -> bool {
        self.lock()
            .groups
            .contains_key(&(stream.clone(), group.clone()))
    }

    pub fn pending_ids(&self, stream: &StreamKey, group: &ConsumerGroup) -> Vec<EntryId> {
        self.lock()
            .groups
            .get(&(stream.clone(), group.clone()))
            .map(|g| g.pel.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn owner(&self, stream: &StreamKey, group: &ConsumerGroup, id: EntryId) -> Option<String> {
        self.lock()
            .groups
            .get(&(stream.clone(), group.clone()))
            .and_then(|g| g.pel.get(&id))
            .map(|d| d.owner.id().to_owned())
    }

    pub fn set_delivery_count(
        &self,
        stream: &StreamKey,
        group: &ConsumerGroup,
        id: EntryId,
        n: u64,
    ) {
        if let Some(d) = self
            .lock()
            .groups
            .get_mut(&(stream.clone(), group.clone()))
            .and_then(|g| g.pel.get_mut(&id))
        {
            d.count = n;
        }
    }

    /// Acknowledge `id` on behalf of another client while the next append is in progress.
    pub fn ack_on_next_append(&self, stream: &StreamKey, group: &ConsumerGroup, id: EntryId) {
        self.lock().ack_on_append = Some((stream.clone(), group.clone(), id));
    }

    pub fn fail(&self, op: Op, fault: Fault) {
        self.lock().faults.push_back((op, fault));
    }

    pub fn calls(&self) -> Vec<Op> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

type MockResult<T> = StreamResult<T, MockErr>;

impl State {
    fn call(&mut self, op: Op) -> MockResult<()> {
        self.calls.push(op);
        if let Some(pos) = self.faults.iter().position(|(o, _)| *o == op) {
            if let Some((_, fault)) = self.faults.remove(pos) {
                return Err(match fault {
                    Fault::GroupMissing => StreamErr::GroupNotFound(format!("NOGROUP {op:?}")),
                    Fault::Backend(e) => StreamErr::Backend(MockErr(e)),
                });
            }
        }
        Ok(())
    }

    fn append(&mut self, stream: &StreamKey, fields: Fields) -> EntryId {
        self.last_millis += 1;
        let id = EntryId::new(self.last_millis, 0);
        self.streams
            .entry(stream.clone())
            .or_default()
            .push(StreamEntry::new(id, fields));
        id
    }

    fn entry(&self, stream: &StreamKey, id: EntryId) -> Option<StreamEntry> {
        self.streams
            .get(stream)
            .and_then(|entries| entries.iter().find(|e| e.id() == &id))
            .cloned()
    }

    fn group(&mut self, handle: &ConsumerGroupHandle) -> MockResult<&mut Group> {
        self.groups
            .get_mut(&(handle.stream().clone(), handle.group().clone()))
            .ok_or_else(|| StreamErr::GroupNotFound(format!("NOGROUP {handle}")))
    }

    /// Hand over a pending entry to the consumer of `handle`.
    fn deliver(&mut self, handle: &ConsumerGroupHandle, id: EntryId) -> MockResult<StreamEntry> {
        let now = self.clock;
        let entry = self
            .entry(handle.stream(), id)
            .unwrap_or_else(|| StreamEntry::new(id, Vec::new()));
        let group = self.group(handle)?;
        let delivery = group.pel.entry(id).or_insert(Delivery {
            owner: handle.consumer().clone(),
            delivered_at: now,
            count: 0,
        });
        delivery.owner = handle.consumer().clone();
        delivery.delivered_at = now;
        delivery.count += 1;
        Ok(entry)
    }

    fn idle(&self, delivery: &Delivery) -> Duration {
        self.clock.saturating_sub(delivery.delivered_at)
    }
}

#[async_trait]
impl StreamStore for MemoryStore {
    type Error = MockErr;

    async fn exists(&mut self, key: &StreamKey) -> MockResult<bool> {
        let mut s = self.lock();
        s.call(Op::Exists)?;
        if s.hidden_checks > 0 {
            s.hidden_checks -= 1;
            return Ok(false);
        }
        Ok(s.streams.contains_key(key))
    }

    async fn create_group(
        &mut self,
        handle: &ConsumerGroupHandle,
        start: EntryId,
    ) -> MockResult<GroupCreated> {
        let mut s = self.lock();
        s.call(Op::CreateGroup)?;
        if !s.streams.contains_key(handle.stream()) {
            return Err(StreamErr::Backend(MockErr(
                "ERR The XGROUP subcommand requires the key to exist".to_owned(),
            )));
        }
        let key = (handle.stream().clone(), handle.group().clone());
        if s.groups.contains_key(&key) {
            return Ok(GroupCreated::AlreadyExists);
        }
        s.groups.insert(
            key,
            Group {
                last_delivered: start,
                pel: Default::default(),
            },
        );
        Ok(GroupCreated::Created)
    }

    async fn read_group_new(
        &mut self,
        handle: &ConsumerGroupHandle,
        count: usize,
        _: Option<Duration>,
    ) -> MockResult<Vec<StreamEntry>> {
        let mut s = self.lock();
        s.call(Op::ReadNew)?;
        let last_delivered = s.group(handle)?.last_delivered;
        let ids: Vec<EntryId> = s
            .streams
            .get(handle.stream())
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| *e.id())
                    .filter(|id| id > &last_delivered)
                    .take(count)
                    .collect()
            })
            .unwrap_or_default();
        let mut entries = Vec::new();
        for id in ids {
            entries.push(s.deliver(handle, id)?);
            s.group(handle)?.last_delivered = id;
        }
        Ok(entries)
    }

    async fn read_group_from(
        &mut self,
        handle: &ConsumerGroupHandle,
        from: EntryId,
        count: usize,
    ) -> MockResult<Vec<StreamEntry>> {
        let mut s = self.lock();
        s.call(Op::ReadFrom)?;
        let ids: Vec<EntryId> = s
            .group(handle)?
            .pel
            .iter()
            .filter(|(id, d)| **id > from && &d.owner == handle.consumer())
            .map(|(id, _)| *id)
            .take(count)
            .collect();
        let mut entries = Vec::new();
        for id in ids {
            entries.push(s.deliver(handle, id)?);
        }
        Ok(entries)
    }

    async fn pending(
        &mut self,
        handle: &ConsumerGroupHandle,
        query: &PendingQuery,
    ) -> MockResult<Vec<PendingRecord>> {
        let mut s = self.lock();
        s.call(Op::Pending)?;
        let clock = s.clock;
        let records = s
            .group(handle)?
            .pel
            .iter()
            .filter(|(id, d)| {
                query.get_start().admits_from(id)
                    && query.get_end().admits_until(id)
                    && query.get_consumer().map_or(true, |c| c == &d.owner)
                    && clock.saturating_sub(d.delivered_at) >= query.get_min_idle()
            })
            .map(|(id, d)| {
                PendingRecord::new(
                    *id,
                    d.owner.clone(),
                    clock.saturating_sub(d.delivered_at),
                    d.count,
                )
            })
            .take(query.get_count().unwrap_or(usize::MAX))
            .collect();
        Ok(records)
    }

    async fn claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> MockResult<Vec<StreamEntry>> {
        let mut s = self.lock();
        s.call(Op::Claim)?;
        let clock = s.clock;
        let mut entries = Vec::new();
        for id in ids {
            let idle = s
                .group(handle)?
                .pel
                .get(id)
                .map(|d| clock.saturating_sub(d.delivered_at));
            if matches!(idle, Some(idle) if idle >= min_idle) {
                entries.push(s.deliver(handle, *id)?);
            }
        }
        Ok(entries)
    }

    async fn auto_claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        start: EntryId,
        count: usize,
    ) -> MockResult<AutoClaimReply> {
        let mut s = self.lock();
        s.call(Op::AutoClaim)?;
        let candidates: Vec<(EntryId, Delivery)> = s
            .group(handle)?
            .pel
            .range(start..)
            .map(|(id, d)| (*id, d.clone()))
            .collect();
        let mut entries = Vec::new();
        let mut next = EntryId::ORIGIN;
        for (id, delivery) in candidates {
            if entries.len() == count {
                next = id;
                break;
            }
            if s.idle(&delivery) >= min_idle {
                entries.push(s.deliver(handle, id)?);
            }
        }
        Ok(AutoClaimReply { next, entries })
    }

    async fn ack(&mut self, handle: &ConsumerGroupHandle, ids: &[EntryId]) -> MockResult<usize> {
        let mut s = self.lock();
        s.call(Op::Ack)?;
        let group = s.group(handle)?;
        Ok(ids.iter().filter(|id| group.pel.remove(*id).is_some()).count())
    }

    async fn append(
        &mut self,
        stream: &StreamKey,
        fields: &[(String, String)],
    ) -> MockResult<EntryId> {
        let mut s = self.lock();
        s.call(Op::Append)?;
        if let Some((key, group, id)) = s.ack_on_append.take() {
            if let Some(group) = s.groups.get_mut(&(key, group)) {
                group.pel.remove(&id);
            }
        }
        Ok(s.append(stream, fields.to_vec()))
    }
}

#[allow(dead_code)]
pub fn init_logger() {
    INIT.call_once(env_logger::init);
}

#[allow(dead_code)]
pub fn stream_key(name: &str) -> StreamKey {
    StreamKey::new(name).unwrap()
}

/// Options that never block, with a short retry schedule.
#[allow(dead_code)]
pub fn options(group: &str, consumer: &str) -> RedisConsumerOptions {
    let mut options = RedisConsumerOptions::new(ConsumerGroup::new(group));
    options
        .set_consumer_id(ConsumerId::new(consumer))
        .set_block(None)
        .set_retry_schedule(RetrySchedule::new(vec![Duration::from_millis(10); 3]));
    options
}

/// A consumer whose group has been created.
#[allow(dead_code)]
pub async fn consumer(
    store: &MemoryStore,
    stream: &StreamKey,
    options: RedisConsumerOptions,
) -> GroupConsumer<MemoryStore> {
    let mut consumer = GroupConsumer::new(store.clone(), stream.clone(), options);
    consumer.ensure_group().await.unwrap();
    consumer
}

#[allow(dead_code)]
pub fn ids(entries: &[StreamEntry]) -> Vec<EntryId> {
    entries.iter().map(|e| *e.id()).collect()
}

/// Append `n` entries with fields `msg: 0`, `msg: 1`, ...
#[allow(dead_code)]
pub fn push_n(store: &MemoryStore, stream: &StreamKey, n: usize) -> Vec<EntryId> {
    (0..n)
        .map(|i| store.push(stream, &[("msg", i.to_string().as_str())]))
        .collect()
}
