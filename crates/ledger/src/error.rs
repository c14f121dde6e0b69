//! Ledger errors
//!
//! Every variant is returned before any state mutation: a failed operation
//! leaves the ledger exactly as it was.

use flightsure_core::{Address, Amount, AmountError, FlightKey, RequestKey, StatusCode, StatusCodeError};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized: {caller} {reason}")]
    Unauthorized { caller: Address, reason: &'static str },

    #[error("Ledger is not operational")]
    NotOperational,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Insufficient funds: required {required}, provided {provided}")]
    InsufficientFunds { required: Amount, provided: Amount },

    #[error("Purchase limit exceeded: limit {limit}, attempted total {attempted}")]
    LimitExceeded { limit: Amount, attempted: Amount },

    #[error("Oracle not registered: {0}")]
    NotRegistered(Address),

    #[error("Index {index} is not assigned to oracle {oracle}")]
    IndexMismatch { oracle: Address, index: u8 },

    #[error("Status request {0} is closed or does not exist")]
    RequestClosed(RequestKey),

    #[error("Oracle already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("Flight {flight} already settled with status {status}")]
    FlightSettled { flight: FlightKey, status: StatusCode },

    // === Registry / escrow lookups ===

    #[error("Unknown airline: {0}")]
    UnknownAirline(Address),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(#[from] StatusCodeError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub(crate) fn unauthorized(caller: &Address, reason: &'static str) -> Self {
        LedgerError::Unauthorized {
            caller: caller.clone(),
            reason,
        }
    }

    /// Late oracle responses and fetches for settled flights land here;
    /// callers may ignore them
    pub fn is_request_closed(&self) -> bool {
        matches!(
            self,
            LedgerError::RequestClosed(_) | LedgerError::FlightSettled { .. }
        )
    }
}
