use std::time::Duration;

use super::{filter, ids, GroupConsumer, ReclaimFilter, DEAD_LETTER_MIN_IDLE};
use redsumer_types::{PendingQuery, StreamKey, StreamResult, StreamStore};

impl<S: StreamStore> GroupConsumer<S> {
    /// Move the entries that have been pending for too long to the dead-letter stream,
    /// as configured by the options. Returns the number of entries moved.
    pub async fn reclaim_dead_letters(&mut self) -> StreamResult<usize, S::Error> {
        let dead_stream = self.dead_letter_stream()?;
        let filter = self
            .options
            .dead_letter_policy()
            .filter(self.options.dead_letter_threshold());
        self.reclaim_dead_letters_with(&dead_stream, filter.as_ref())
            .await
    }

    /// Move the entries idle for at least `threshold` to `dead_stream`.
    pub async fn reclaim_dead_letters_to(
        &mut self,
        dead_stream: &StreamKey,
        threshold: Duration,
    ) -> StreamResult<usize, S::Error> {
        let filter = self.options.dead_letter_policy().filter(threshold);
        self.reclaim_dead_letters_with(dead_stream, filter.as_ref())
            .await
    }

    /// Move the pending entries (of any consumer of the group) selected by `filter` to
    /// `dead_stream`: they are claimed by this consumer, appended to the dead-letter stream
    /// with their original fields, then acknowledged.
    ///
    /// An entry is only acknowledged after it has been appended. On error, the remaining
    /// entries stay pending and will be picked up by the next run; an entry may end up in
    /// the dead-letter stream twice if the acknowledgement itself failed.
    ///
    /// An entry acknowledged by someone else in the meantime is not counted as moved,
    /// even though it has already been appended.
    pub async fn reclaim_dead_letters_with<F: ReclaimFilter + ?Sized>(
        &mut self,
        dead_stream: &StreamKey,
        filter_by: &F,
    ) -> StreamResult<usize, S::Error> {
        let query = PendingQuery::new().min_idle(DEAD_LETTER_MIN_IDLE);
        let records = self.store.pending(&self.handle, &query).await?;
        let dead = ids(filter(&records, filter_by));
        if dead.is_empty() {
            log::trace!("{}: no dead letters among {} pending", self.handle, records.len());
            return Ok(0);
        }

        let entries = self
            .store
            .claim(&self.handle, DEAD_LETTER_MIN_IDLE, &dead)
            .await?;
        let mut moved = 0;
        for entry in entries {
            let id = *entry.id();
            if entry.fields().is_empty() {
                // deleted from the stream; there is nothing left to forward
                log::warn!("{}: dead letter {id} has no content", self.handle);
            } else {
                self.store.append(dead_stream, entry.fields()).await?;
            }
            if self.store.ack(&self.handle, &[id]).await? == 0 {
                // acknowledged by its previous owner after we claimed it
                log::warn!(
                    "{}: {id} was forwarded to {dead_stream} but had already been acknowledged",
                    self.handle
                );
                continue;
            }
            log::debug!("{}: moved {id} to {dead_stream}", self.handle);
            moved += 1;
        }
        log::info!(
            "{}: moved {moved} dead letters to {dead_stream}",
            self.handle
        );
        Ok(moved)
    }
}
