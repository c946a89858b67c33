//! # Redsumer Types
//!
//! This crate defines the traits and types shared by the Redsumer consumer-group engine,
//! but does not talk to any store. The [`StreamStore`] trait is the boundary between the
//! engine and a concrete backend; see `redsumer-redis` for the Redis implementation.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

mod consumer;
mod error;
mod message;
mod options;
mod store;
mod stream;
mod streamer;

pub use consumer::*;
pub use error::*;
pub use message::*;
pub use options::*;
pub use store::*;
pub use stream::*;
pub use streamer::*;

pub mod export;
