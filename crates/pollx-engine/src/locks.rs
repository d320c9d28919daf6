//! Per-poll write serialization
//!
//! Two writers reconciling the same poll would each compute a keep-set from
//! their own tree and could prune the other's new children. Writers take the
//! poll's lock for the whole reconciliation; writers on different polls do not
//! contend. Entries are created on first use and dropped by `release` once
//! the poll is deleted.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pollx_core::PollError;
use pollx_store::errors::Result;
use uuid::Uuid;

/// Registry of one mutex per poll identifier
///
/// Cloning shares the registry, so every façade built from the same
/// `PollLocks` serializes against the others.
#[derive(Debug, Clone, Default)]
pub struct PollLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

fn poisoned(resource: &str) -> PollError {
    PollError::LockPoisoned {
        resource: resource.to_string(),
    }
}

impl PollLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, poll_id: Uuid) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.inner.lock().map_err(|_| poisoned("poll_locks"))?;
        Ok(locks.entry(poll_id).or_default().clone())
    }

    /// Run `f` while holding the lock for `poll_id`
    pub fn with_poll<T>(&self, poll_id: Uuid, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.entry(poll_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| poisoned(&format!("poll:{}", poll_id)))?;
        f()
    }

    /// Forget the lock of a deleted poll
    ///
    /// The entry stays when another writer holds or waits on it; that
    /// writer's later `with_poll` keeps serializing on the same mutex.
    pub fn release(&self, poll_id: Uuid) -> Result<()> {
        let mut locks = self.inner.lock().map_err(|_| poisoned("poll_locks"))?;
        if locks
            .get(&poll_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&poll_id);
        }
        Ok(())
    }

    /// Number of polls with a live registry entry
    pub fn len(&self) -> usize {
        self.inner.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_poll_is_serialized() {
        let locks = PollLocks::new();
        let poll_id = Uuid::now_v7();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks
                        .with_poll(poll_id, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(10));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_release_drops_idle_entry() {
        let locks = PollLocks::new();
        let poll_id = Uuid::now_v7();
        locks.with_poll(poll_id, || Ok(())).unwrap();
        assert_eq!(locks.len(), 1);

        locks.release(poll_id).unwrap();
        assert!(locks.is_empty());
        locks.release(poll_id).unwrap();
    }

    #[test]
    fn test_release_keeps_entry_while_held() {
        let locks = PollLocks::new();
        let poll_id = Uuid::now_v7();

        locks
            .with_poll(poll_id, || {
                locks.release(poll_id)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_error_passes_through() {
        let locks = PollLocks::new();
        let poll_id = Uuid::now_v7();
        let result: Result<()> =
            locks.with_poll(poll_id, || Err(PollError::PollNotFound { poll_id }.into()));
        assert!(result.unwrap_err().is_not_found());
    }
}
