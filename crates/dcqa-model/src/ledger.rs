//! Append-only exception ledger.
//!
//! The ledger is an explicit collector handed to every stage by reference.
//! It is `Send + Sync` so batches processed on separate threads can share one
//! ledger, or each use their own and be merged with [`ExceptionLedger::absorb`]
//! once the batch completes.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::exception::{ExceptionEvent, Priority};

#[derive(Debug, Default)]
pub struct ExceptionLedger {
    events: Mutex<Vec<ExceptionEvent>>,
}

impl ExceptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: ExceptionEvent) {
        self.lock().push(event);
    }

    /// Moves every event of `other` to the end of this ledger.
    pub fn absorb(&self, other: ExceptionLedger) {
        let events = other.into_events();
        self.lock().extend(events);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all events in append order.
    pub fn snapshot(&self) -> Vec<ExceptionEvent> {
        self.lock().clone()
    }

    pub fn into_events(self) -> Vec<ExceptionEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn counts_by_issue(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in self.lock().iter() {
            *counts.entry(event.issue_type.code().into_owned()).or_insert(0) += 1;
        }
        counts
    }

    pub fn counts_by_priority(&self) -> BTreeMap<Priority, usize> {
        let mut counts = BTreeMap::new();
        for event in self.lock().iter() {
            *counts.entry(event.priority).or_insert(0) += 1;
        }
        counts
    }

    // A panic in another producer must not drop events already appended.
    fn lock(&self) -> MutexGuard<'_, Vec<ExceptionEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::exception::IssueType;

    #[test]
    fn appends_in_order() {
        let ledger = ExceptionLedger::new();
        ledger.append(ExceptionEvent::new("Brand", IssueType::BrandUnmapped));
        ledger.append(ExceptionEvent::new("FX", IssueType::FxMissing));
        let events = ledger.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].issue_type, IssueType::BrandUnmapped);
        assert_eq!(events[1].issue_type, IssueType::FxMissing);
    }

    #[test]
    fn absorb_moves_batch_events() {
        let run = ExceptionLedger::new();
        let batch = ExceptionLedger::new();
        batch.append(ExceptionEvent::new("Vendor", IssueType::VendorUnmapped));
        run.absorb(batch);
        assert_eq!(run.len(), 1);
        assert_eq!(run.counts_by_issue().get("vendor_unmapped"), Some(&1));
        assert_eq!(run.counts_by_priority().get(&Priority::P2), Some(&1));
    }

    #[test]
    fn concurrent_producers_do_not_lose_events() {
        let ledger = Arc::new(ExceptionLedger::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for _ in 0..250 {
                        ledger.append(ExceptionEvent::new("Row", IssueType::RowDroppedEmpty));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.len(), 1000);
    }
}
