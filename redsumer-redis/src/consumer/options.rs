use super::constants::*;
use redsumer_types::{ConsumerGroup, ConsumerId, RetrySchedule, StreamKey, WaitPolicy};
use std::time::Duration;

#[derive(Debug, Clone)]
/// Options of a [`GroupConsumer`](crate::GroupConsumer).
pub struct RedisConsumerOptions {
    group: ConsumerGroup,
    consumer_id: Option<ConsumerId>,
    batch_size: usize,
    block: Option<Duration>,
    pending: PendingTier,
    auto_claim: AutoClaimTier,
    retry_schedule: RetrySchedule,
    wait_policy: WaitPolicy,
    dead_letter_stream: Option<StreamKey>,
    dead_letter_threshold: Duration,
    dead_letter_policy: DeadLetterPolicy,
    still_mine_idle: Duration,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Whether (and how) to re-deliver this consumer's own pending entries.
pub enum PendingTier {
    Disabled,
    /// Page through own pending entries, `batch_size` at a time.
    Enabled { batch_size: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Whether (and how) to take over entries abandoned by other consumers.
pub enum AutoClaimTier {
    Disabled,
    /// Claim up to `batch_size` entries that have been idle for at least `min_idle`.
    Enabled { batch_size: usize, min_idle: Duration },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Decides which pending entries are moved to the dead-letter stream.
pub enum DeadLetterPolicy {
    /// Idle for at least the threshold.
    Idle,
    /// Idle for longer than the threshold plus `e^delivery_count` milliseconds.
    /// Entries that keep being retried are given more and more time.
    IdleAndRetries,
}

impl RedisConsumerOptions {
    pub fn new(group: ConsumerGroup) -> Self {
        Self {
            group,
            consumer_id: None,
            batch_size: DEFAULT_BATCH_SIZE,
            block: Some(DEFAULT_BLOCK),
            pending: PendingTier::Disabled,
            auto_claim: AutoClaimTier::Disabled,
            retry_schedule: RetrySchedule::from_secs(&DEFAULT_RETRY_SCHEDULE),
            wait_policy: WaitPolicy::default(),
            dead_letter_stream: None,
            dead_letter_threshold: DEFAULT_DEAD_LETTER_THRESHOLD,
            dead_letter_policy: DeadLetterPolicy::Idle,
            still_mine_idle: Duration::ZERO,
        }
    }

    pub fn group(&self) -> &ConsumerGroup {
        &self.group
    }
    pub fn set_group(&mut self, group: ConsumerGroup) -> &mut Self {
        self.group = group;
        self
    }

    /// Redis requires consumers to self-assign consumer IDs.
    /// If unset, [`default_consumer_id`](crate::default_consumer_id) is used.
    pub fn consumer_id(&self) -> Option<&ConsumerId> {
        self.consumer_id.as_ref()
    }
    pub fn set_consumer_id(&mut self, consumer_id: ConsumerId) -> &mut Self {
        self.consumer_id = Some(consumer_id);
        self
    }

    /// Maximum number of new entries returned by one consume call.
    ///
    /// If unset, defaults to [`DEFAULT_BATCH_SIZE`].
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
    pub fn set_batch_size(&mut self, v: usize) -> &mut Self {
        assert_ne!(v, 0);
        self.batch_size = v;
        self
    }

    /// How long to wait for new entries to arrive. `None` means don't wait at all.
    ///
    /// If unset, defaults to [`DEFAULT_BLOCK`].
    pub fn block(&self) -> Option<Duration> {
        self.block
    }
    pub fn set_block(&mut self, v: Option<Duration>) -> &mut Self {
        self.block = v;
        self
    }

    /// Defaults to `Disabled`.
    pub fn pending(&self) -> &PendingTier {
        &self.pending
    }
    pub fn set_pending(&mut self, v: PendingTier) -> &mut Self {
        if let PendingTier::Enabled { batch_size } = v {
            assert_ne!(batch_size, 0);
        }
        self.pending = v;
        self
    }

    /// Defaults to `Disabled`.
    pub fn auto_claim(&self) -> &AutoClaimTier {
        &self.auto_claim
    }
    pub fn set_auto_claim(&mut self, v: AutoClaimTier) -> &mut Self {
        if let AutoClaimTier::Enabled { batch_size, .. } = v {
            assert_ne!(batch_size, 0);
        }
        self.auto_claim = v;
        self
    }

    /// The waits between checks for the stream to come into existence.
    ///
    /// If unset, defaults to [`DEFAULT_RETRY_SCHEDULE`].
    pub fn retry_schedule(&self) -> &RetrySchedule {
        &self.retry_schedule
    }
    pub fn set_retry_schedule(&mut self, v: RetrySchedule) -> &mut Self {
        self.retry_schedule = v;
        self
    }

    /// Defaults to [`WaitPolicy::CheckThenSleep`].
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }
    pub fn set_wait_policy(&mut self, v: WaitPolicy) -> &mut Self {
        self.wait_policy = v;
        self
    }

    /// Where dead letters are moved to.
    /// If unset, it is `dead:letters:` followed by the name of the consumed stream.
    pub fn dead_letter_stream(&self) -> Option<&StreamKey> {
        self.dead_letter_stream.as_ref()
    }
    pub fn set_dead_letter_stream(&mut self, v: StreamKey) -> &mut Self {
        self.dead_letter_stream = Some(v);
        self
    }

    /// If unset, defaults to [`DEFAULT_DEAD_LETTER_THRESHOLD`].
    pub fn dead_letter_threshold(&self) -> Duration {
        self.dead_letter_threshold
    }
    pub fn set_dead_letter_threshold(&mut self, v: Duration) -> &mut Self {
        self.dead_letter_threshold = v;
        self
    }

    /// Defaults to [`DeadLetterPolicy::Idle`].
    pub fn dead_letter_policy(&self) -> DeadLetterPolicy {
        self.dead_letter_policy
    }
    pub fn set_dead_letter_policy(&mut self, v: DeadLetterPolicy) -> &mut Self {
        self.dead_letter_policy = v;
        self
    }

    /// Minimum idle time an entry must have for [`still_mine`](crate::GroupConsumer::still_mine)
    /// to report it. Zero (the default) means only ownership is checked.
    pub fn still_mine_idle(&self) -> Duration {
        self.still_mine_idle
    }
    pub fn set_still_mine_idle(&mut self, v: Duration) -> &mut Self {
        self.still_mine_idle = v;
        self
    }
}
