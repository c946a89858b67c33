use redis::{ErrorKind, RedisError};
use redsumer_types::{StreamErr, StreamResult};
use thiserror::Error;

/// Error code of a command addressing a consumer group (or stream) that does not exist.
pub const NOGROUP: &str = "NOGROUP";
/// Error code of `XGROUP CREATE` when the group already exists.
pub const BUSYGROUP: &str = "BUSYGROUP";

#[derive(Error, Debug, Clone)]
/// Different types of Redis errors.
pub enum RedisErr {
    #[error("Failed to parse entry id: {0}")]
    EntryId(String),
    #[error("Failed to parse reply: {0}")]
    Reply(String),
    #[error("The server generated an invalid response: {0}")]
    ResponseError(String),
    #[error("The authentication with the server failed: {0}")]
    AuthenticationFailed(String),
    #[error("Operation failed because of a type mismatch: {0}")]
    TypeError(String),
    #[error("A script execution was aborted: {0}")]
    ExecAbortError(String),
    #[error("The server cannot response because it's loading a dump: {0}")]
    BusyLoadingError(String),
    #[error("A script that was requested does not actually exist: {0}")]
    NoScriptError(String),
    #[error("An error that was caused because the parameter to the client were wrong: {0}")]
    InvalidClientConfig(String),
    #[error("Raised if a key moved to a different node: {0}")]
    Moved(String),
    #[error("Raised if a key moved to a different node but we need to ask: {0}")]
    Ask(String),
    #[error("Raised if a request needs to be retried: {0}")]
    TryAgain(String),
    #[error("Raised if a redis cluster is down: {0}")]
    ClusterDown(String),
    #[error("A request spans multiple slots: {0}")]
    CrossSlot(String),
    #[error("A cluster master is unavailable: {0}")]
    MasterDown(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("An error raised that was identified on the client before execution: {0}")]
    ClientError(String),
    #[error("Extension error: {0}")]
    ExtensionError(String),
    #[error("Attempt to write to a read-only server: {0}")]
    ReadOnly(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// A type alias for convenience.
pub type RedisResult<T> = StreamResult<T, RedisErr>;

/// Convert a [`RedisError`] into a [`StreamErr`].
///
/// The server codes `NOGROUP` and `BUSYGROUP` are lifted to [`StreamErr::GroupNotFound`]
/// and [`StreamErr::GroupExists`] respectively, so that the engine can tell them apart
/// without inspecting messages.
pub fn map_err(err: RedisError) -> StreamErr<RedisErr> {
    let e = format!("{err}");
    match err.code() {
        Some(NOGROUP) => return StreamErr::GroupNotFound(e),
        Some(BUSYGROUP) => return StreamErr::GroupExists(e),
        _ => (),
    }
    StreamErr::Backend(match err.kind() {
        ErrorKind::ResponseError => RedisErr::ResponseError(e),
        ErrorKind::AuthenticationFailed => RedisErr::AuthenticationFailed(e),
        ErrorKind::TypeError => RedisErr::TypeError(e),
        ErrorKind::ExecAbortError => RedisErr::ExecAbortError(e),
        ErrorKind::BusyLoadingError => RedisErr::BusyLoadingError(e),
        ErrorKind::NoScriptError => RedisErr::NoScriptError(e),
        ErrorKind::InvalidClientConfig => RedisErr::InvalidClientConfig(e),
        ErrorKind::Moved => RedisErr::Moved(e),
        ErrorKind::Ask => RedisErr::Ask(e),
        ErrorKind::TryAgain => RedisErr::TryAgain(e),
        ErrorKind::ClusterDown => RedisErr::ClusterDown(e),
        ErrorKind::CrossSlot => RedisErr::CrossSlot(e),
        ErrorKind::MasterDown => RedisErr::MasterDown(e),
        ErrorKind::IoError => RedisErr::IoError(e),
        ErrorKind::ClientError => RedisErr::ClientError(e),
        ErrorKind::ExtensionError => RedisErr::ExtensionError(e),
        ErrorKind::ReadOnly => RedisErr::ReadOnly(e),
        #[allow(unreachable_patterns)]
        _ => RedisErr::Unknown(e),
    })
}

/// Whether the error means the connection is broken and should be re-established.
pub(crate) fn is_disconnect(err: &StreamErr<RedisErr>) -> bool {
    matches!(err, StreamErr::Backend(RedisErr::IoError(_)))
}
