//! Ledger notifications
//!
//! Every state transition of the facade emits one or more `LedgerEvent`s,
//! delivered synchronously and in order to each registered listener.

use flightsure_core::{Address, Amount, FlightKey, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use strum_macros::IntoStaticStr;

/// Notifications emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// A status request was opened; oracles holding `index` should answer
    OracleRequest { index: u8, flight: FlightKey },

    /// An oracle answered a status request
    OracleReport {
        index: u8,
        flight: FlightKey,
        status: StatusCode,
        oracle: Address,
    },

    /// A flight reached its final status
    FlightStatusInfo { flight: FlightKey, status: StatusCode },

    OperatingStatusChanged { operational: bool, by: Address },

    /// A vote was recorded for a candidate that is not yet a member
    AirlineVoted {
        candidate: Address,
        voter: Address,
        votes: usize,
        required: usize,
    },

    AirlineRegistered {
        airline: Address,
        name: String,
        votes: usize,
    },

    AirlineFunded {
        airline: Address,
        amount: Amount,
        stake: Amount,
        newly_funded: bool,
    },

    InsurancePurchased {
        passenger: Address,
        flight: FlightKey,
        amount: Amount,
        total: Amount,
    },

    /// Insurees of a settled flight were credited
    InsureesCredited {
        flight: FlightKey,
        status: StatusCode,
        passengers: usize,
        total: Amount,
    },

    PassengerPaid { passenger: Address, amount: Amount },

    OracleRegistered { oracle: Address, indexes: [u8; 3] },
}

impl LedgerEvent {
    /// Variant name, for logging
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Flight this event concerns, if any
    pub fn flight(&self) -> Option<&FlightKey> {
        match self {
            LedgerEvent::OracleRequest { flight, .. }
            | LedgerEvent::OracleReport { flight, .. }
            | LedgerEvent::FlightStatusInfo { flight, .. }
            | LedgerEvent::InsurancePurchased { flight, .. }
            | LedgerEvent::InsureesCredited { flight, .. } => Some(flight),
            _ => None,
        }
    }
}

/// Receives ledger notifications
///
/// Called while the ledger is mid-operation: implementations must not block
/// and cannot reject the event. Failures are the listener's to log.
pub trait EventListener: Send {
    /// Listener name (for logging)
    fn name(&self) -> &str;

    fn on_event(&mut self, event: &LedgerEvent);
}

/// Keeps every event in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Names of the events seen so far, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LedgerEvent::name).collect()
    }
}

impl EventListener for RecordingListener {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&mut self, event: &LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> FlightKey {
        FlightKey::new("0xa1", "ND1309", 1_700_000_000)
    }

    #[test]
    fn test_event_name() {
        let event = LedgerEvent::FlightStatusInfo {
            flight: flight(),
            status: StatusCode::LateAirline,
        };
        assert_eq!(event.name(), "FlightStatusInfo");
        assert_eq!(event.flight(), Some(&flight()));
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = LedgerEvent::OracleRequest {
            index: 4,
            flight: flight(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "OracleRequest");
        assert_eq!(json["index"], 4);
        assert_eq!(json["flight"]["flight"], "ND1309");

        let parsed: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_status_serialized_as_code() {
        let event = LedgerEvent::FlightStatusInfo {
            flight: flight(),
            status: StatusCode::LateAirline,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], 20);
    }

    #[test]
    fn test_recording_listener_shares_log() {
        let handle = RecordingListener::new();
        let mut listener = handle.clone();

        listener.on_event(&LedgerEvent::PassengerPaid {
            passenger: Address::new("0xp1"),
            amount: Amount::ether(1),
        });

        assert_eq!(handle.names(), vec!["PassengerPaid"]);
    }
}
