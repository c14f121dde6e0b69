//! FlightSure Ledger - airline governance, insurance escrow and oracle consensus
//!
//! All state changes go through `FlightSuretyLedger`. The stores behind it
//! are reachable only through the facade.
//!
//! # Key Types
//! - `FlightSuretyLedger`: the facade; every operation is atomic
//! - `AccessGate`: operational switch and authorized-caller list
//! - `AirlineRegistry`: membership, voting and funding
//! - `InsuranceEscrow`: purchases and withdrawable balances
//! - `OracleConsensus`: oracle indices, status requests and quorum
//! - `LedgerEvent` / `EventListener`: synchronous notifications

pub mod config;
pub mod consensus;
pub mod error;
pub mod escrow;
pub mod event;
pub mod facade;
pub mod gate;
pub mod index;
pub mod payout;
pub mod registry;

pub use config::{ConfigError, LedgerConfig};
pub use consensus::{OracleConsensus, ResponseOutcome, ResponsePlan};
pub use error::{LedgerError, LedgerResult};
pub use escrow::{Credit, InsuranceEscrow};
pub use event::{EventListener, LedgerEvent, RecordingListener};
pub use facade::{ledger_address, FlightSuretyLedger};
pub use gate::AccessGate;
pub use index::{
    draw_distinct, HashIndexSource, IndexSource, IndexSourceKind, RngIndexSource,
    SequenceIndexSource,
};
pub use payout::{Payout, PayoutLog, PayoutSink};
pub use registry::{AirlineRegistry, FundingOutcome, RegistrationOutcome};
