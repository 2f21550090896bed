//! In-flight request table
//!
//! Serializes concurrent misses for the same resource so only one of them
//! reaches the fetch function at a time. A failure of the caller holding a
//! resource is kept on the slot and handed to the callers queued behind it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::FetchError;

type SlotLock = Arc<AsyncMutex<Option<FetchError>>>;
type Slots = Arc<Mutex<HashMap<String, Slot>>>;

#[derive(Debug)]
struct Slot {
    lock: SlotLock,
    /// Callers holding or waiting on the lock
    users: usize,
}

// == In Flight ==
/// Per-resource locks, created on demand and dropped when nobody holds or
/// waits on them.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    slots: Slots,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `resource_id`, then holds it until
    /// the returned guard is dropped.
    ///
    /// Cancelling the wait gives the slot back like dropping a guard does.
    pub async fn acquire(&self, resource_id: &str) -> InFlightGuard {
        let (lease, lock) = SlotLease::join(&self.slots, resource_id);
        let guard = lock.lock_owned().await;

        InFlightGuard {
            guard,
            _lease: lease,
        }
    }

    /// Number of resources currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Slot Lease ==
/// Registration of one caller on a slot; the last one out removes it.
#[derive(Debug)]
struct SlotLease {
    slots: Slots,
    resource_id: String,
}

impl SlotLease {
    fn join(slots: &Slots, resource_id: &str) -> (Self, SlotLock) {
        let mut table = slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = table.entry(resource_id.to_string()).or_insert_with(|| Slot {
            lock: Arc::new(AsyncMutex::new(None)),
            users: 0,
        });
        slot.users += 1;

        let lease = Self {
            slots: slots.clone(),
            resource_id: resource_id.to_string(),
        };
        (lease, slot.lock.clone())
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        let mut table = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = match table.get_mut(&self.resource_id) {
            Some(slot) => {
                slot.users -= 1;
                slot.users == 0
            }
            None => false,
        };
        if idle {
            table.remove(&self.resource_id);
        }
    }
}

// == In Flight Guard ==
/// Holds one resource; releases it on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    // Released before the lease so the slot is never removed while locked
    guard: OwnedMutexGuard<Option<FetchError>>,
    _lease: SlotLease,
}

impl InFlightGuard {
    /// Failure left by an earlier holder of this resource, if any.
    pub fn failure(&self) -> Option<&FetchError> {
        self.guard.as_ref()
    }

    /// Leaves `error` for the callers queued behind this one.
    pub fn record_failure(&mut self, error: FetchError) {
        *self.guard = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, task};

    fn failure() -> FetchError {
        FetchError::Status {
            resource: "a".to_string(),
            status: 500,
        }
    }

    #[tokio::test]
    async fn test_slot_removed_after_release() {
        let in_flight = InFlight::new();

        let guard = in_flight.acquire("a").await;
        assert_eq!(in_flight.len(), 1);

        drop(guard);
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_same_resource_serializes() {
        let in_flight = InFlight::new();
        let guard = in_flight.acquire("a").await;

        let waiter = {
            let in_flight = in_flight.clone();
            tokio::spawn(async move {
                let _guard = in_flight.acquire("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_different_resources_independent() {
        let in_flight = InFlight::new();

        let _a = in_flight.acquire("a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), in_flight.acquire("b"))
            .await
            .expect("different resource should not block");

        assert_eq!(in_flight.len(), 2);
    }

    #[test]
    fn test_waiter_cancelled_after_release_frees_slot() {
        let in_flight = InFlight::new();
        let holder = tokio_test::block_on(in_flight.acquire("a"));

        let mut waiter = task::spawn(in_flight.acquire("a"));
        assert_pending!(waiter.poll());

        // The lock is handed to the waiter, which is dropped before it runs
        drop(holder);
        assert!(waiter.is_woken());
        drop(waiter);

        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_cancelled_while_waiting_frees_slot() {
        let in_flight = InFlight::new();
        let holder = in_flight.acquire("a").await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), in_flight.acquire("a")).await;
        assert!(timed_out.is_err());
        assert_eq!(in_flight.len(), 1);

        drop(holder);
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_failure_visible_to_queued_caller() {
        let in_flight = InFlight::new();
        let mut holder = in_flight.acquire("a").await;
        assert!(holder.failure().is_none());

        let waiter = {
            let in_flight = in_flight.clone();
            tokio::spawn(async move {
                let guard = in_flight.acquire("a").await;
                let failure = guard.failure().cloned();
                failure
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        holder.record_failure(failure());
        drop(holder);

        assert_eq!(waiter.await.unwrap(), Some(failure()));
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_failure_forgotten_once_slot_idle() {
        let in_flight = InFlight::new();

        let mut holder = in_flight.acquire("a").await;
        holder.record_failure(failure());
        drop(holder);

        assert!(in_flight.acquire("a").await.failure().is_none());
    }
}
