//! ### `redsumer-redis`: Consumer groups over Redis Streams
//!
//! This crate provides a high-level async API for consuming a Redis Stream as a member of a
//! consumer group, so that entries are processed at least once even when consumers crash:
//!
//! + You don't call `XREADGROUP`, `XAUTOCLAIM` or `XACK` anymore
//! + Every [`GroupConsumer::consume`] call fetches from three tiers in a fixed order:
//!     1. entries never delivered to any consumer of the group
//!     2. entries delivered to this consumer but not yet acknowledged (optional)
//!     3. entries abandoned by other consumers, claimed after an idle timeout (optional)
//! + A missing consumer group (e.g. after a server restart or a `FLUSHALL`) is re-created on the fly
//! + Entries that can't be processed within a threshold are moved to a dead-letter stream
//!
//! Within each tier, the engine keeps a cursor client side, so that successive calls page
//! through the pending entries instead of returning the same batch again. The cursors wrap
//! around to the origin when a scan is complete.
//!
//! Since the engine only relies on the [`StreamStore`] trait, it can be tested against any
//! store, not only a live Redis server. [`RedisStore`] is the Redis implementation.
//!
//! ```ignore
//! let streamer = RedisStreamer::connect("redis://localhost:6379".parse()?, Default::default()).await?;
//! let options = RedisConsumerOptions::new(ConsumerGroup::new("workers"));
//! let mut consumer = streamer.create_consumer(StreamKey::new("orders")?, options).await?;
//! loop {
//!     for entry in consumer.consume().await? {
//!         process(&entry).await?;
//!         consumer.ack(&[*entry.id()]).await?;
//!     }
//! }
//! ```
//!
//! This crate is built on top of [`redis`](https://docs.rs/redis).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

/// The default Redis port number
pub const REDIS_PORT: u16 = 6379;

/// The default timeout, if needed but unspecified
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

#[cfg(all(feature = "runtime-async-std", feature = "runtime-tokio"))]
compile_error!("'runtime-async-std' and 'runtime-tokio' cannot be enabled at the same time");

#[cfg(not(any(feature = "runtime-async-std", feature = "runtime-tokio")))]
compile_error!("Please enable one of the runtimes: 'runtime-async-std' or 'runtime-tokio'");

mod connection;
mod consumer;
mod error;
mod host;
mod message;
mod producer;
mod registry;
mod store;
mod streamer;

pub use connection::*;
pub use consumer::*;
pub use error::*;
pub use host::*;
pub use message::*;
pub use producer::*;
pub use registry::*;
pub use store::*;
pub use streamer::*;

pub use redsumer_types::*;
