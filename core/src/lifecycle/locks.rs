// bazaar/src/lifecycle/locks.rs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-user async mutexes serializing every read-modify-write of one user's orders.
///
/// Different users never contend. Entries are dropped once no task holds or waits
/// on them, so the map stays proportional to in-flight users.
#[derive(Debug, Default)]
pub struct UserLocks {
  slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn acquire(&self, user_id: Uuid) -> UserLockGuard<'_> {
    let slot = self.slots.lock().entry(user_id).or_default().clone();
    let guard = slot.clone().lock_owned().await;
    UserLockGuard {
      locks: self,
      user_id,
      slot,
      _guard: Some(guard),
    }
  }

  /// Users with a live lock entry.
  pub fn active_users(&self) -> usize {
    self.slots.lock().len()
  }
}

pub struct UserLockGuard<'a> {
  locks: &'a UserLocks,
  user_id: Uuid,
  slot: Arc<AsyncMutex<()>>,
  _guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard<'_> {
  fn drop(&mut self) {
    // Release the mutex first so the strong count below reflects only waiters.
    self._guard.take();
    let mut slots = self.locks.slots.lock();
    // The map and this guard hold the only references: nobody else is waiting.
    if Arc::strong_count(&self.slot) == 2 {
      slots.remove(&self.user_id);
    }
  }
}
