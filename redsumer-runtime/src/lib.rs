//! ### `redsumer-runtime`: Async runtime abstraction
//!
//! This crate provides a small set of functions aligning the type signatures between `async-std` and `tokio`,
//! so that the consumer-group engine stays generic to both runtimes.

#[cfg(all(feature = "runtime-async-std", feature = "runtime-tokio"))]
compile_error!("'runtime-async-std' and 'runtime-tokio' cannot be enabled at the same time");

mod rwlock;
mod sleep;
mod timeout;

pub use rwlock::*;
pub use sleep::*;
pub use timeout::*;
