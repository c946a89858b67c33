use std::{fmt::Debug, time::Duration};

use super::DeadLetterPolicy;
use redsumer_types::{EntryId, PendingRecord};

/// Decides whether a pending entry may be reclaimed.
pub trait ReclaimFilter: Debug + Send + Sync {
    fn eligible(&self, record: &PendingRecord) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Eligible once idle for at least the threshold.
pub struct IdleThreshold(pub Duration);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Eligible once idle for longer than `threshold + e^delivery_count` milliseconds.
pub struct IdleAndRetries(pub Duration);

impl ReclaimFilter for IdleThreshold {
    fn eligible(&self, record: &PendingRecord) -> bool {
        record.idle() >= self.0
    }
}

impl ReclaimFilter for IdleAndRetries {
    fn eligible(&self, record: &PendingRecord) -> bool {
        let idle = record.idle().as_secs_f64() * 1000.0;
        let threshold = self.0.as_secs_f64() * 1000.0;
        // overflows to infinity for large counts, which is never exceeded
        idle > threshold + (record.delivery_count() as f64).exp()
    }
}

impl DeadLetterPolicy {
    pub fn filter(&self, threshold: Duration) -> Box<dyn ReclaimFilter> {
        match self {
            Self::Idle => Box::new(IdleThreshold(threshold)),
            Self::IdleAndRetries => Box::new(IdleAndRetries(threshold)),
        }
    }
}

/// The eligible records, in input order.
pub fn filter<'a, F: ReclaimFilter + ?Sized>(
    records: &'a [PendingRecord],
    filter: &'a F,
) -> impl Iterator<Item = &'a PendingRecord> + 'a {
    records.iter().filter(move |r| filter.eligible(r))
}

pub fn ids<'a>(records: impl Iterator<Item = &'a PendingRecord>) -> Vec<EntryId> {
    records.map(|r| *r.id()).collect()
}
