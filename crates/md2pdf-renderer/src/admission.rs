//! Request admission
//!
//! The service renders at most `max_concurrent` documents at a time. A
//! request arriving when every slot is taken is turned away instead of
//! queued; the caller decides whether to try again.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counter of in-flight renders with a fixed ceiling
#[derive(Debug, Clone)]
pub struct Admission {
    slots: Arc<Semaphore>,
    max: usize,
}

/// A held render slot, released on drop
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Admission {
    /// Allow up to `max` concurrent renders (at least one)
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Take a slot, or `None` when all are in use
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.slots)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _permit: permit })
    }

    /// Renders currently in progress
    pub fn in_flight(&self) -> usize {
        self.max - self.slots.available_permits()
    }

    /// Slot ceiling
    pub fn max(&self) -> usize {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_max() {
        let admission = Admission::new(2);
        let first = admission.try_acquire();
        let second = admission.try_acquire();

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(admission.try_acquire().is_none());
        assert_eq!(admission.in_flight(), 2);
    }

    #[test]
    fn test_release_on_drop() {
        let admission = Admission::new(1);
        let permit = admission.try_acquire().unwrap();
        assert!(admission.try_acquire().is_none());

        drop(permit);
        assert_eq!(admission.in_flight(), 0);
        assert!(admission.try_acquire().is_some());
    }

    #[test]
    fn test_zero_means_one() {
        let admission = Admission::new(0);
        assert_eq!(admission.max(), 1);
        assert!(admission.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_slots() {
        let admission = Admission::new(1);
        let clone = admission.clone();
        let _permit = admission.try_acquire().unwrap();
        assert!(clone.try_acquire().is_none());
        assert_eq!(clone.in_flight(), 1);
    }
}
