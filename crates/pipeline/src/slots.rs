//! Per-key admission for blocking inference calls.
//!
//! A timed-out call keeps running on the blocking pool; its slot stays
//! taken until the call actually returns, so a hung model holds at most one
//! thread per machine.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Default)]
pub(crate) struct ScoringSlots {
    busy: Arc<Mutex<HashSet<String>>>,
}

impl ScoringSlots {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the slot for `key`, or `None` while a call for it is running.
    pub(crate) fn try_acquire(&self, key: &str) -> Option<ScoringSlot> {
        if !self.lock().insert(key.to_string()) {
            return None;
        }
        Some(ScoringSlot {
            key: key.to_string(),
            slots: self.clone(),
        })
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.lock().len()
    }
}

/// Released on drop, i.e. when the blocking call that owns it returns.
pub(crate) struct ScoringSlot {
    key: String,
    slots: ScoringSlots,
}

impl Drop for ScoringSlot {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_waits_for_release() {
        let slots = ScoringSlots::default();
        let first = slots.try_acquire("M1").unwrap();
        assert!(slots.try_acquire("M1").is_none());
        assert!(slots.try_acquire("M2").is_some());
        assert_eq!(slots.in_flight(), 1);

        drop(first);
        assert_eq!(slots.in_flight(), 0);
        assert!(slots.try_acquire("M1").is_some());
    }
}
