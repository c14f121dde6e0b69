//! Access gate - operational switch and caller allow-list

use flightsure_core::Address;
use std::collections::HashSet;

use crate::error::{LedgerError, LedgerResult};

/// Owner-managed operational flag plus the set of identities allowed to
/// mutate the stores.
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Address,
    operational: bool,
    authorized: HashSet<Address>,
}

impl AccessGate {
    /// Operational gate with an empty allow-list
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: true,
            authorized: HashSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if caller != &self.owner {
            return Err(LedgerError::unauthorized(caller, "is not the ledger owner"));
        }
        Ok(())
    }

    pub fn require_operational(&self) -> LedgerResult<()> {
        if !self.operational {
            return Err(LedgerError::NotOperational);
        }
        Ok(())
    }

    /// Setting the current value again is allowed
    pub fn set_operating_status(&mut self, operational: bool, caller: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        self.operational = operational;
        Ok(())
    }

    pub fn authorize_caller(&mut self, identity: Address, caller: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        self.authorized.insert(identity);
        Ok(())
    }

    pub fn deauthorize_caller(&mut self, identity: &Address, caller: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        self.authorized.remove(identity);
        Ok(())
    }

    pub fn is_authorized_caller(&self, identity: &Address) -> bool {
        self.authorized.contains(identity)
    }

    pub fn require_authorized_caller(&self, identity: &Address) -> LedgerResult<()> {
        if !self.is_authorized_caller(identity) {
            return Err(LedgerError::unauthorized(identity, "is not an authorized caller"));
        }
        Ok(())
    }
}
