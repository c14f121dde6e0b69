//! Journal record - one ledger notification per JSONL line

use chrono::{DateTime, Utc};
use flightsure_ledger::LedgerEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// 1-based, contiguous across files
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: LedgerEvent,
}

impl JournalRecord {
    pub fn new(sequence: u64, event: LedgerEvent) -> Self {
        Self {
            sequence,
            recorded_at: Utc::now(),
            event,
        }
    }
}
