use super::GroupConsumer;
use redsumer_runtime::sleep;
use redsumer_types::{
    ConsumerGroupHandle, EntryId, GroupCreated, RetrySchedule, StreamErr, StreamKey,
    StreamResult, StreamStore, WaitPolicy,
};

/// Wait for a stream to come into existence, checking according to `schedule` and `policy`.
/// Fails with [`StreamErr::StreamNotFound`] once the schedule is exhausted.
pub async fn wait_for_stream<S: StreamStore>(
    store: &mut S,
    stream: &StreamKey,
    schedule: &RetrySchedule,
    policy: WaitPolicy,
) -> StreamResult<(), S::Error> {
    let mut checks = 0;
    match policy {
        WaitPolicy::CheckThenSleep => {
            let mut waits = schedule.waits().iter();
            loop {
                checks += 1;
                if store.exists(stream).await? {
                    break;
                }
                match waits.next() {
                    Some(wait) => {
                        log::debug!("Stream {stream} does not exist yet; retrying in {wait:?}");
                        sleep(*wait).await;
                    }
                    None => return Err(not_found(stream, checks)),
                }
            }
        }
        WaitPolicy::SleepThenCheck => {
            let mut found = false;
            for wait in schedule.waits() {
                sleep(*wait).await;
                checks += 1;
                if store.exists(stream).await? {
                    found = true;
                    break;
                }
                log::debug!("Stream {stream} does not exist yet");
            }
            if !found {
                return Err(not_found(stream, checks));
            }
        }
    }
    if checks > 1 {
        log::info!("Stream {stream} found after {checks} checks");
    }
    Ok(())
}

fn not_found<E: std::error::Error>(stream: &StreamKey, checks: usize) -> StreamErr<E> {
    log::warn!("Stream {stream} still does not exist after {checks} checks; giving up");
    StreamErr::StreamNotFound(stream.to_string())
}

/// Make sure the consumer group exists: wait for the stream, then create the group
/// at the origin of the stream. An already existing group is not an error.
pub async fn ensure_group<S: StreamStore>(
    store: &mut S,
    handle: &ConsumerGroupHandle,
    schedule: &RetrySchedule,
    policy: WaitPolicy,
) -> StreamResult<GroupCreated, S::Error> {
    wait_for_stream(store, handle.stream(), schedule, policy).await?;
    let created = store.create_group(handle, EntryId::ORIGIN).await?;
    match created {
        GroupCreated::Created => log::info!("Created consumer group {handle}"),
        GroupCreated::AlreadyExists => log::debug!("Consumer group {handle} already exists"),
    }
    Ok(created)
}

impl<S: StreamStore> GroupConsumer<S> {
    /// [`wait_for_stream`] with the configured schedule.
    pub async fn wait_for_stream(&mut self) -> StreamResult<(), S::Error> {
        wait_for_stream(
            &mut self.store,
            self.handle.stream(),
            self.options.retry_schedule(),
            self.options.wait_policy(),
        )
        .await
    }

    /// [`ensure_group`] with the configured schedule.
    pub async fn ensure_group(&mut self) -> StreamResult<GroupCreated, S::Error> {
        ensure_group(
            &mut self.store,
            &self.handle,
            self.options.retry_schedule(),
            self.options.wait_policy(),
        )
        .await
    }
}
