use std::{fmt::Display, str::FromStr, sync::Arc};
pub use time::OffsetDateTime as Timestamp;

use crate::{EntryIdErr, StreamKeyErr};

/// Canonical display format for Timestamp.
pub const TIMESTAMP_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies a stream. It is the key of the stream in the store, and can be any
/// non-empty string, including cluster hash tags like `user{42}:events`.
pub struct StreamKey {
    name: Arc<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies an entry within a stream. It comprises the millisecond timestamp at which
/// the entry was appended, and a sequence number to disambiguate entries appended within
/// the same millisecond. Ids are totally ordered and strictly increasing within a stream.
pub struct EntryId {
    millis: u64,
    seq: u64,
}

impl StreamKey {
    pub fn new<S: Into<String>>(key: S) -> Result<Self, StreamKeyErr> {
        let key = key.into();
        if is_valid_stream_key(key.as_str()) {
            Ok(Self {
                name: Arc::new(key),
            })
        } else {
            Err(StreamKeyErr::InvalidStreamKey)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EntryId {
    /// The origin of every stream: `0-0`. No entry can have this id,
    /// so reading "after" it means reading from the very beginning.
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_origin(&self) -> bool {
        self == &Self::ORIGIN
    }

    /// The wall-clock time at which the entry was appended, as recorded by the store.
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_unix_timestamp_nanos(self.millis as i128 * 1_000_000)
            .unwrap_or(Timestamp::UNIX_EPOCH)
    }
}

impl Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

impl FromStr for StreamKey {
    type Err = StreamKeyErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamKey::new(s)
    }
}

impl FromStr for EntryId {
    type Err = EntryIdErr;

    /// Accepts `<millis>-<seq>`, or `<millis>` alone which means sequence `0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EntryIdErr::InvalidEntryId(s.to_owned());
        let (millis, seq) = match s.split_once('-') {
            Some((millis, seq)) => (millis, seq),
            None => (s, "0"),
        };
        let millis = millis.parse::<u64>().map_err(|_| err())?;
        let seq = seq.parse::<u64>().map_err(|_| err())?;
        Ok(Self::new(millis, seq))
    }
}

pub fn is_valid_stream_key(s: &str) -> bool {
    !s.is_empty()
}
