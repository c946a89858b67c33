use std::time::Duration;

use crate::{
    auto_claim_from_redis_value, entries_from_redis_value, entry_id_from_redis_value,
    int_from_redis_value, pending_from_redis_value, read_reply_from_redis_value, Connection,
    RedisErr, RedisResult,
};
use redis::{cmd as command, streams::StreamReadOptions, Cmd, Value};
use redsumer_runtime::timeout;
use redsumer_types::{
    export::async_trait, AutoClaimReply, ConsumerGroupHandle, EntryId, GroupCreated, IdBound,
    PendingQuery, PendingRecord, StreamEntry, StreamErr, StreamKey, StreamStore,
};

/// Page size used when listing an unbounded range of pending entries.
pub const PENDING_PAGE_SIZE: usize = 1000;

#[derive(Debug)]
/// [`StreamStore`] backed by a single Redis connection.
pub struct RedisStore {
    conn: Connection,
    timeout: Duration,
}

impl RedisStore {
    /// `timeout` bounds every request, on top of the blocking time of blocking reads.
    pub fn new(conn: Connection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    async fn request(&mut self, name: &str, cmd: &Cmd, extra: Duration) -> RedisResult<Value> {
        log::debug!("{name} on {}", self.conn.node_id());
        match timeout(self.timeout + extra, self.conn.request(cmd)).await {
            Ok(res) => res,
            Err(_) => {
                // the reply is still on its way; the connection will be re-established
                log::warn!("{name} on {} timed out", self.conn.node_id());
                Err(StreamErr::Timeout)
            }
        }
    }

    async fn pending_page(
        &mut self,
        handle: &ConsumerGroupHandle,
        query: &PendingQuery,
        start: IdBound,
        count: usize,
    ) -> RedisResult<Vec<PendingRecord>> {
        let cmd = pending_cmd(handle, query, start, count);
        let reply = self.request("XPENDING", &cmd, Duration::ZERO).await?;
        pending_from_redis_value(reply)
    }
}

/// `XREADGROUP` of entries never delivered to the group. A `block` of zero is sent as 1ms,
/// because `BLOCK 0` would block forever.
pub fn read_group_new_cmd(
    handle: &ConsumerGroupHandle,
    count: usize,
    block: Option<Duration>,
) -> Cmd {
    let mut opts = StreamReadOptions::default()
        .group(handle.group().name(), handle.consumer().id())
        .count(count);
    if let Some(block) = block {
        opts = opts.block(block.as_millis().max(1) as usize);
    }
    let mut cmd = command("XREADGROUP");
    cmd.arg(&opts)
        .arg("STREAMS")
        .arg(handle.stream().name())
        .arg(">");
    cmd
}

/// One page of `XPENDING`, in the extended form. `IDLE` is only sent when non-zero.
pub fn pending_cmd(
    handle: &ConsumerGroupHandle,
    query: &PendingQuery,
    start: IdBound,
    count: usize,
) -> Cmd {
    let mut cmd = command("XPENDING");
    cmd.arg(handle.stream().name()).arg(handle.group().name());
    if !query.get_min_idle().is_zero() {
        cmd.arg("IDLE").arg(query.get_min_idle().as_millis() as u64);
    }
    cmd.arg(start.to_string())
        .arg(query.get_end().to_string())
        .arg(count);
    if let Some(consumer) = query.get_consumer() {
        cmd.arg(consumer.id());
    }
    cmd
}

/// Where the page after `page` starts, or `None` if `page` was the last one.
pub fn next_pending_page(page: &[PendingRecord], page_size: usize) -> Option<IdBound> {
    if page.len() < page_size {
        return None;
    }
    page.last().map(|last| IdBound::After(*last.id()))
}

#[async_trait]
impl StreamStore for RedisStore {
    type Error = RedisErr;

    async fn exists(&mut self, key: &StreamKey) -> RedisResult<bool> {
        let mut cmd = command("EXISTS");
        cmd.arg(key.name());
        let reply = self.request("EXISTS", &cmd, Duration::ZERO).await?;
        Ok(int_from_redis_value(reply)? > 0)
    }

    async fn create_group(
        &mut self,
        handle: &ConsumerGroupHandle,
        start: EntryId,
    ) -> RedisResult<GroupCreated> {
        let mut cmd = command("XGROUP");
        cmd.arg("CREATE")
            .arg(handle.stream().name())
            .arg(handle.group().name())
            .arg(start.to_string());
        match self.request("XGROUP", &cmd, Duration::ZERO).await {
            Ok(_) => Ok(GroupCreated::Created),
            Err(StreamErr::GroupExists(_)) => Ok(GroupCreated::AlreadyExists),
            Err(err) => Err(err),
        }
    }

    async fn read_group_new(
        &mut self,
        handle: &ConsumerGroupHandle,
        count: usize,
        block: Option<Duration>,
    ) -> RedisResult<Vec<StreamEntry>> {
        let cmd = read_group_new_cmd(handle, count, block);
        let reply = self
            .request("XREADGROUP", &cmd, block.unwrap_or_default())
            .await?;
        read_reply_from_redis_value(reply)
    }

    async fn read_group_from(
        &mut self,
        handle: &ConsumerGroupHandle,
        from: EntryId,
        count: usize,
    ) -> RedisResult<Vec<StreamEntry>> {
        let opts = StreamReadOptions::default()
            .group(handle.group().name(), handle.consumer().id())
            .count(count);
        let mut cmd = command("XREADGROUP");
        cmd.arg(&opts)
            .arg("STREAMS")
            .arg(handle.stream().name())
            .arg(from.to_string());
        let reply = self.request("XREADGROUP", &cmd, Duration::ZERO).await?;
        read_reply_from_redis_value(reply)
    }

    async fn pending(
        &mut self,
        handle: &ConsumerGroupHandle,
        query: &PendingQuery,
    ) -> RedisResult<Vec<PendingRecord>> {
        if let Some(count) = query.get_count() {
            return self
                .pending_page(handle, query, query.get_start(), count)
                .await;
        }
        let mut records = Vec::new();
        let mut start = query.get_start();
        loop {
            let page = self
                .pending_page(handle, query, start, PENDING_PAGE_SIZE)
                .await?;
            let next = next_pending_page(&page, PENDING_PAGE_SIZE);
            records.extend(page);
            match next {
                Some(next) => start = next,
                None => break,
            }
        }
        Ok(records)
    }

    async fn claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        ids: &[EntryId],
    ) -> RedisResult<Vec<StreamEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = command("XCLAIM");
        cmd.arg(handle.stream().name())
            .arg(handle.group().name())
            .arg(handle.consumer().id())
            .arg(min_idle.as_millis() as u64);
        for id in ids {
            cmd.arg(id.to_string());
        }
        let reply = self.request("XCLAIM", &cmd, Duration::ZERO).await?;
        entries_from_redis_value(reply)
    }

    async fn auto_claim(
        &mut self,
        handle: &ConsumerGroupHandle,
        min_idle: Duration,
        start: EntryId,
        count: usize,
    ) -> RedisResult<AutoClaimReply> {
        let mut cmd = command("XAUTOCLAIM");
        cmd.arg(handle.stream().name())
            .arg(handle.group().name())
            .arg(handle.consumer().id())
            .arg(min_idle.as_millis() as u64)
            .arg(start.to_string())
            .arg("COUNT")
            .arg(count);
        let reply = self.request("XAUTOCLAIM", &cmd, Duration::ZERO).await?;
        auto_claim_from_redis_value(reply)
    }

    async fn ack(&mut self, handle: &ConsumerGroupHandle, ids: &[EntryId]) -> RedisResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut cmd = command("XACK");
        cmd.arg(handle.stream().name()).arg(handle.group().name());
        for id in ids {
            cmd.arg(id.to_string());
        }
        let reply = self.request("XACK", &cmd, Duration::ZERO).await?;
        Ok(int_from_redis_value(reply)?.max(0) as usize)
    }

    async fn append(
        &mut self,
        stream: &StreamKey,
        fields: &[(String, String)],
    ) -> RedisResult<EntryId> {
        let mut cmd = command("XADD");
        cmd.arg(stream.name()).arg("*");
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let reply = self.request("XADD", &cmd, Duration::ZERO).await?;
        entry_id_from_redis_value(reply)
    }
}
