//! <div align="center">
//!
//!   <h1>Redsumer</h1>
//!
//!   <p>
//!     <strong>At-least-once consumer groups over Redis Streams</strong>
//!   </p>
//!
//! </div>
//!
//! Redsumer lets a fleet of workers share the processing of a Redis Stream, such that every
//! entry is processed at least once even when workers crash mid-way.
//!
//! ## Features
//!
//! 1. Async
//!
//! Redsumer provides an async API, and it supports both `tokio` and `async-std`.
//!
//! 2. Self-healing
//!
//! Consumers wait for the stream to come into existence, and re-create their consumer group
//! if it disappears, e.g. after a server restart without persistence.
//!
//! 3. Crash tolerant
//!
//! Entries left pending by a crashed worker are taken over by the others once idle for long
//! enough; entries that can't be processed at all are moved aside to a dead-letter stream.
//!
//! 4. Testable
//!
//! The consumer-group engine only talks to the store through the `StreamStore` trait, so it can
//! be tested without a Redis server.
//!
//! ## Architecture
//!
//! `redsumer` is the facade crate re-exporting implementation from a number of sub-crates:
//!
//! + `redsumer-types`: the store interface and the types shared by every crate
//! + `redsumer-redis`: the consumer-group engine and its Redis backend
//! + `redsumer-runtime`: aligning `tokio` and `async-std`

pub use redsumer_types::*;

#[cfg(feature = "redsumer-redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redsumer-redis")))]
pub use redsumer_redis::{
    default_consumer_id, ensure_group, host_id, wait_for_stream, AutoClaimTier,
    ConnectionRegistry, Cursor, DeadLetterPolicy, GroupConsumer, IdleAndRetries, IdleThreshold,
    PendingTier, ReclaimFilter, RedisConnectOptions, RedisConsumerOptions, RedisErr,
    RedisProducer, RedisResult, RedisStore, RedisStreamer, Tier,
};

#[cfg(feature = "redsumer-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "redsumer-runtime")))]
pub use redsumer_runtime as runtime;
