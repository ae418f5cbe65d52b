//! Port adapters: in-memory and SQLite persistence, plus notification sinks.

mod memory;
mod notifications;
mod sqlite;

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use super::repository::RepositoryError;

pub use memory::InMemoryLifecycleStore;
pub use notifications::{InMemoryNotifications, TracingNotifications};
pub use sqlite::SqliteLifecycleStore;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(2_000);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_micros(250);

/// Acquire `mutex` or give up once `timeout` has elapsed.
pub(crate) fn lock_within<'a, T>(
    mutex: &'a Mutex<T>,
    timeout: Duration,
) -> Result<MutexGuard<'a, T>, RepositoryError> {
    let deadline = Instant::now() + timeout;
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(_)) => {
                return Err(RepositoryError::Unavailable(
                    "store lock poisoned by a panicked writer".to_string(),
                ))
            }
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(RepositoryError::Timeout {
                        millis: timeout_millis(timeout),
                    });
                }
                thread::sleep(LOCK_RETRY_INTERVAL);
            }
        }
    }
}

pub(crate) fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
