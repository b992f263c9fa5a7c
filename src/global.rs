use crate::error::StoreError;
use crate::store::EventStore;
use std::sync::{Mutex, MutexGuard, OnceLock};

static INSTANCE: OnceLock<Mutex<EventStore>> = OnceLock::new();

impl EventStore {
    /// Returns the process-wide store, creating it on first use.
    ///
    /// The store is meant to be driven by one pipeline at a time; the mutex
    /// only serializes whole-store access and is held for as long as the
    /// returned guard lives. Entries registered here stay until the process
    /// exits.
    ///
    /// The lock is not re-entrant: calling `instance` or
    /// [`with_instance`](Self::with_instance) again on the same thread while a
    /// guard is still alive deadlocks. Stages should take `&mut EventStore`
    /// from their caller rather than fetching the instance themselves.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockError` if a previous holder panicked while
    /// holding the lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_eventstore::{EventStore, StoreFlags};
    ///
    /// {
    ///     let mut store = EventStore::instance()?;
    ///     *store.register::<u32>("doc::EventNumber", StoreFlags::empty())? = 12;
    /// }
    ///
    /// let store = EventStore::instance()?;
    /// assert_eq!(store.get::<u32>("doc::EventNumber"), Some(&12));
    /// # Ok::<(), sovran_eventstore::StoreError>(())
    /// ```
    pub fn instance() -> Result<MutexGuard<'static, EventStore>, StoreError> {
        INSTANCE
            .get_or_init(|| Mutex::new(EventStore::new()))
            .lock()
            .map_err(|_| StoreError::LockError)
    }

    /// Runs `f` with exclusive access to the process-wide store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockError` if the lock cannot be acquired.
    pub fn with_instance<F, R>(f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut EventStore) -> R,
    {
        let mut store = Self::instance()?;
        Ok(f(&mut store))
    }
}
