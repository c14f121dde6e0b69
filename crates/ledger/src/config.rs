//! Ledger configuration with configurable business constants
//!
//! Stakes, caps, fees and quorum sizes are read from file/JSON so a
//! deployment can be tuned without recompilation. Defaults match the
//! production contract values (10 ETH stake, 1 ETH cap, 1 ETH oracle fee).

use flightsure_core::{Amount, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::index::IndexSourceKind;

/// Errors from loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Configuration for the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    // === Airline governance ===
    /// Minimum value of a single funding action that marks an airline funded
    #[serde(default = "default_minimum_stake")]
    pub minimum_stake: Amount,

    /// Airlines registered without voting until this many members exist
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: usize,

    // === Insurance ===
    /// Cap per (passenger, flight) purchase
    #[serde(default = "default_max_purchase")]
    pub max_purchase: Amount,

    /// Credit = purchase * multiplier
    #[serde(default = "default_payout_multiplier")]
    pub payout_multiplier: Decimal,

    /// Final statuses that credit insurees
    #[serde(default = "default_payout_statuses")]
    pub payout_statuses: Vec<StatusCode>,

    // === Oracles ===
    /// Fee paid to register an oracle
    #[serde(default = "default_registration_fee")]
    pub registration_fee: Amount,

    /// Matching responses required to finalize a status request
    #[serde(default = "default_min_responses")]
    pub min_responses: usize,

    /// Indices are drawn from `0..index_space`
    #[serde(default = "default_index_space")]
    pub index_space: u8,

    /// How oracle indices are drawn
    #[serde(default)]
    pub index_source: IndexSourceKind,

    /// Seed for `IndexSourceKind::Entropy`; drawn from the OS when absent
    #[serde(default)]
    pub index_seed: Option<u64>,
}

// Default value functions for serde
fn default_minimum_stake() -> Amount {
    Amount::ether(10)
}

fn default_consensus_threshold() -> usize {
    4
}

fn default_max_purchase() -> Amount {
    Amount::ether(1)
}

fn default_payout_multiplier() -> Decimal {
    Decimal::new(15, 1) // 1.5x
}

fn default_payout_statuses() -> Vec<StatusCode> {
    vec![StatusCode::LateAirline]
}

fn default_registration_fee() -> Amount {
    Amount::ether(1)
}

fn default_min_responses() -> usize {
    3
}

fn default_index_space() -> u8 {
    10
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            minimum_stake: default_minimum_stake(),
            consensus_threshold: default_consensus_threshold(),
            max_purchase: default_max_purchase(),
            payout_multiplier: default_payout_multiplier(),
            payout_statuses: default_payout_statuses(),
            registration_fee: default_registration_fee(),
            min_responses: default_min_responses(),
            index_space: default_index_space(),
            index_source: IndexSourceKind::default(),
            index_seed: None,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the constants describe a workable ledger
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.problem() {
            Some(reason) => Err(ConfigError::Invalid(reason)),
            None => Ok(()),
        }
    }

    /// First constant that makes the ledger unworkable, if any
    pub fn problem(&self) -> Option<&'static str> {
        if self.index_space < 3 {
            return Some("index_space must allow three distinct indices");
        }
        if self.min_responses == 0 {
            return Some("min_responses must be at least 1");
        }
        if self.consensus_threshold == 0 {
            return Some("consensus_threshold must be at least 1");
        }
        if self.payout_multiplier < Decimal::ZERO {
            return Some("payout_multiplier cannot be negative");
        }
        None
    }

    /// Whether a final status credits insurees
    pub fn pays_out(&self, status: StatusCode) -> bool {
        self.payout_statuses.contains(&status)
    }
}
