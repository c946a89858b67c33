use std::str::Utf8Error;
use thiserror::Error;

/// Type alias of the [`Result`] type specific to `redsumer`.
pub type StreamResult<T, E> = std::result::Result<T, StreamErr<E>>;

#[derive(Error, Debug)]
/// Common errors that may occur.
pub enum StreamErr<E: std::error::Error> {
    #[error("Connection Error: {0}")]
    Connect(String),
    #[error("Timeout has not yet been set")]
    TimeoutNotSet,
    #[error("Operation timed out")]
    Timeout,
    #[error("Stream `{0}` does not exist after exhausting the retry schedule")]
    StreamNotFound(String),
    #[error("Consumer group does not exist: {0}")]
    GroupNotFound(String),
    #[error("Consumer group already exists: {0}")]
    GroupExists(String),
    #[error("No message has been acknowledged")]
    NoAckedMessage,
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("Utf8Error: {0}")]
    Utf8Error(Utf8Error),
    #[error("StreamUrlErr {0}")]
    StreamUrlErr(#[from] StreamUrlErr),
    #[error("StreamKeyErr {0}")]
    StreamKeyErr(#[from] StreamKeyErr),
    #[error("EntryIdErr {0}")]
    EntryIdErr(#[from] EntryIdErr),
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
    #[error("Backend error: {0}")]
    Backend(E),
    #[error("Runtime error: {0}")]
    Runtime(Box<dyn std::error::Error + Send + Sync>),
}

impl<E: std::error::Error> StreamErr<E> {
    /// Whether the store reported that the consumer group is missing.
    /// The engine recovers from this by re-creating the group.
    pub fn is_group_missing(&self) -> bool {
        matches!(self, Self::GroupNotFound(_))
    }
}

#[derive(Error, Debug)]
/// Errors that may happen when parsing stream URL
pub enum StreamUrlErr {
    #[error("UrlParseError {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("StreamKeyErr {0}")]
    StreamKeyErr(#[from] StreamKeyErr),
    #[error("Expected one stream key, found zero or more than one")]
    NotOneStreamKey,
    #[error("No node has been specified")]
    ZeroNode,
    #[error("Protocol is required")]
    ProtocolRequired,
}

#[derive(Error, Debug)]
/// Errors that may happen when handling StreamKey
pub enum StreamKeyErr {
    #[error("Invalid stream key: must not be empty")]
    InvalidStreamKey,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that may happen when parsing an entry id
pub enum EntryIdErr {
    #[error("Invalid entry id `{0}`: expected `<millis>-<seq>`")]
    InvalidEntryId(String),
}

/// Function to construct a [`StreamErr::Runtime`] error variant.
pub fn runtime_error<T: std::error::Error, E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> StreamErr<T> {
    StreamErr::Runtime(Box::new(e))
}
