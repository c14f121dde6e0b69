//! FlightSure RPC - CLI orchestrator
//!
//! This crate provides the CLI binary, the deployment bootstrap and the
//! in-process oracle-response simulator.

pub mod commands;
pub mod context;
pub mod deploy;
pub mod simulator;

pub use context::AppContext;
pub use deploy::DeploymentConfig;
pub use simulator::{OracleSimulator, SharedLedger, StatusReporter};
