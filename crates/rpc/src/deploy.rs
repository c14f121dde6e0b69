//! Deployment bootstrap
//!
//! A deployment fixes the ledger owner and the first airline, and publishes
//! the ledger address for the front end and the oracle simulator.

use flightsure_core::Address;
use flightsure_ledger::{ledger_address, FlightSuretyLedger, LedgerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_URL: &str = "http://localhost:8545";
pub const DEFAULT_OWNER: &str = "0x627306090abaB3A6e1400e9345bC60c78a8BEf57";
pub const DEFAULT_FIRST_AIRLINE: &str = "0xf17f52151EbEF6C7334FAD080c5704D77216b732";
pub const DEFAULT_FIRST_AIRLINE_NAME: &str = "APPLE AIR";

/// Configuration handed to collaborators after deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub url: String,
    pub ledger_address: Address,
    pub owner: Address,
    pub first_airline: Address,
    pub first_airline_name: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_URL,
            Address::new(DEFAULT_OWNER),
            Address::new(DEFAULT_FIRST_AIRLINE),
            DEFAULT_FIRST_AIRLINE_NAME,
        )
    }
}

impl DeploymentConfig {
    pub fn new(
        url: impl Into<String>,
        owner: Address,
        first_airline: Address,
        first_airline_name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            ledger_address: ledger_address(&owner),
            owner,
            first_airline,
            first_airline_name: first_airline_name.into(),
        }
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write as pretty JSON
    pub fn write(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Create the ledger and fund the first airline with the minimum stake
    pub fn deploy(&self, config: LedgerConfig) -> anyhow::Result<FlightSuretyLedger> {
        let stake = config.minimum_stake;
        let mut ledger = FlightSuretyLedger::new(
            config,
            self.owner.clone(),
            self.first_airline.clone(),
            &self.first_airline_name,
        )?;
        ledger.fund_airline(&self.first_airline, stake, &self.first_airline)?;

        anyhow::ensure!(
            ledger.identity() == &self.ledger_address,
            "deployment config ledger address {} does not match owner {}",
            self.ledger_address,
            self.owner
        );
        Ok(ledger)
    }
}
