//! Payout transfers
//!
//! `pay` zeroes a passenger's balance and only then hands the transfer to a
//! `PayoutSink`. A sink that calls back into the ledger sees the balance
//! already at zero.

use chrono::{DateTime, Utc};
use flightsure_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A value transfer out of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub passenger: Address,
    pub amount: Amount,
    pub paid_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(passenger: Address, amount: Amount) -> Self {
        Self {
            passenger,
            amount,
            paid_at: Utc::now(),
        }
    }
}

/// Destination of payouts
pub trait PayoutSink: Send {
    fn transfer(&mut self, payout: &Payout);
}

/// Keeps every payout in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct PayoutLog {
    payouts: Arc<Mutex<Vec<Payout>>>,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payouts(&self) -> Vec<Payout> {
        self.payouts
            .lock()
            .map(|payouts| payouts.clone())
            .unwrap_or_default()
    }

    /// Sum transferred to `passenger`
    pub fn total_for(&self, passenger: &Address) -> Amount {
        self.payouts()
            .iter()
            .filter(|payout| &payout.passenger == passenger)
            .fold(Amount::ZERO, |total, payout| {
                total.checked_add(&payout.amount).unwrap_or(total)
            })
    }
}

impl PayoutSink for PayoutLog {
    fn transfer(&mut self, payout: &Payout) {
        if let Ok(mut payouts) = self.payouts.lock() {
            payouts.push(payout.clone());
        }
    }
}
