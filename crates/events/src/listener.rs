//! Journal listener - writes every ledger notification to the JSONL store

use crate::store::EventStore;
use flightsure_ledger::{EventListener, LedgerEvent};

pub struct JournalListener {
    store: EventStore,
    failures: usize,
}

impl JournalListener {
    pub fn new(store: EventStore) -> Self {
        Self { store, failures: 0 }
    }

    /// Events that could not be written
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl EventListener for JournalListener {
    fn name(&self) -> &str {
        "journal"
    }

    fn on_event(&mut self, event: &LedgerEvent) {
        match self.store.append(event) {
            Ok(record) => {
                tracing::trace!(sequence = record.sequence, event = event.name(), "Event journaled");
            }
            Err(e) => {
                self.failures += 1;
                tracing::error!(event = event.name(), error = %e, "Failed to journal event");
            }
        }
    }
}
