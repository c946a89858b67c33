use crate::StreamResult;
use std::time::Duration;

pub trait ConnectOptions: Default + Clone + Send {
    type Error: std::error::Error;

    fn timeout(&self) -> StreamResult<Duration, Self::Error>;
    fn set_timeout(&mut self, d: Duration) -> StreamResult<&mut Self, Self::Error>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// The waits, in order, between successive checks for a stream to come into existence.
/// Once all waits are used up, the stream is deemed missing.
pub struct RetrySchedule {
    waits: Vec<Duration>,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
/// How a [`RetrySchedule`] interleaves waits with existence checks.
pub enum WaitPolicy {
    /// Check first, and only wait after a failed check. A stream that already exists is
    /// detected without any delay. A schedule of N waits results in at most N + 1 checks.
    #[default]
    CheckThenSleep,
    /// Wait before every check. A schedule of N waits results in exactly N checks,
    /// and an empty schedule fails without checking.
    SleepThenCheck,
}

impl RetrySchedule {
    pub fn new(waits: Vec<Duration>) -> Self {
        Self { waits }
    }

    /// Construct from a list of waits in whole seconds.
    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().map(|s| Duration::from_secs(*s)).collect())
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    pub fn len(&self) -> usize {
        self.waits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    /// Sum of all waits; the longest time a wait can take, excluding the checks themselves.
    pub fn total(&self) -> Duration {
        self.waits.iter().sum()
    }
}

impl From<Vec<Duration>> for RetrySchedule {
    fn from(waits: Vec<Duration>) -> Self {
        Self::new(waits)
    }
}
