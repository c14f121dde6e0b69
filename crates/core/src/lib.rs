//! FlightSure Core - Domain types
//!
//! This crate contains the value types shared by every FlightSure component:
//! - `Address`: Identity of an owner, airline, passenger or oracle
//! - `Amount`: Non-negative decimal wrapper for ether-denominated values
//! - `FlightKey` / `StatusCode`: What is insured and how it resolved
//! - `Airline`, `Oracle`, `StatusRequest`: Records owned by the ledger stores

pub mod address;
pub mod amount;
pub mod flight;
pub mod record;

pub use address::Address;
pub use amount::{Amount, AmountError};
pub use flight::{FlightKey, RequestKey, StatusCode, StatusCodeError};
pub use record::{Airline, Oracle, StatusRequest};
