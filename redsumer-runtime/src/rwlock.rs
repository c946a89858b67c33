#[cfg(feature = "runtime-tokio")]
pub use tokio::sync::RwLock as AsyncRwLock;

#[cfg(feature = "runtime-async-std")]
pub use async_std::sync::RwLock as AsyncRwLock;

#[cfg(not(any(feature = "runtime-tokio", feature = "runtime-async-std")))]
mod no_rt_rwlock {
    use std::ops::{Deref, DerefMut};

    #[derive(Debug)]
    pub struct AsyncRwLock<T> {
        m: std::marker::PhantomData<T>,
    }

    impl<T> AsyncRwLock<T> {
        pub fn new(_: T) -> Self {
            Self {
                m: Default::default(),
            }
        }

        pub async fn read(&self) -> Self {
            Self {
                m: Default::default(),
            }
        }

        pub async fn write(&self) -> Self {
            Self {
                m: Default::default(),
            }
        }
    }

    impl<T> Deref for AsyncRwLock<T> {
        type Target = T;

        fn deref(&self) -> &Self::Target {
            unimplemented!("Please enable a runtime")
        }
    }

    impl<T> DerefMut for AsyncRwLock<T> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            unimplemented!("Please enable a runtime")
        }
    }
}

#[cfg(not(any(feature = "runtime-tokio", feature = "runtime-async-std")))]
pub use no_rt_rwlock::*;
