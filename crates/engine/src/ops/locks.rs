//! Per claim sheet serialization.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError, Weak},
};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Dead entries are purged once the map grows past this size.
const CLEANUP_THRESHOLD: usize = 64;

/// Keyed async mutex: one lock per claim sheet.
///
/// Writers of the same sheet queue up behind each other, different sheets
/// never contend. Entries are held as `Weak` so a sheet nobody is writing to
/// costs nothing once its guards are gone.
#[derive(Debug, Default)]
pub(super) struct ParentLocks {
    locks: StdMutex<HashMap<Uuid, Weak<Mutex<()>>>>,
}

/// Holds the lock of one claim sheet until dropped.
#[derive(Debug)]
pub(super) struct ParentGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ParentLocks {
    pub(super) async fn acquire(&self, claim_sheet_id: Uuid) -> ParentGuard {
        let mutex = {
            let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

            let mutex = map
                .get(&claim_sheet_id)
                .and_then(Weak::upgrade)
                .unwrap_or_else(|| {
                    let mutex = Arc::new(Mutex::new(()));
                    map.insert(claim_sheet_id, Arc::downgrade(&mutex));
                    mutex
                });

            if map.len() > CLEANUP_THRESHOLD {
                map.retain(|_, weak| weak.strong_count() > 0);
            }

            mutex
        };

        ParentGuard {
            _guard: mutex.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
