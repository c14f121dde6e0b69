//! Airline registry - membership, multi-party voting and funding
//!
//! Below `consensus_threshold` members any funded airline may register a
//! new one directly. From then on a candidate needs votes from at least
//! half of the current members (`votes * 2 >= airline_count`).

use flightsure_core::{Address, Airline, Amount};
use std::collections::HashMap;

use crate::error::{LedgerError, LedgerResult};

/// Result of a `register` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Candidate is now a member
    Registered { votes: usize },
    /// Vote recorded (or ignored as a repeat); candidate still waiting
    Pending { votes: usize, required: usize },
    /// Candidate was already a member; nothing changed
    AlreadyRegistered,
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        !matches!(self, RegistrationOutcome::Pending { .. })
    }
}

/// Result of a successful `fund` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingOutcome {
    /// This call flipped the funded flag
    pub newly_funded: bool,
    /// Cumulative stake after this call
    pub stake: Amount,
}

#[derive(Debug, Clone)]
pub struct AirlineRegistry {
    airlines: HashMap<Address, Airline>,
    airline_count: usize,
    consensus_threshold: usize,
}

impl AirlineRegistry {
    /// Registry whose only member is `first_airline` (unfunded)
    pub fn new(first_airline: Address, name: impl Into<String>, consensus_threshold: usize) -> Self {
        let mut airline = Airline::candidate(first_airline.clone(), name);
        airline.registered = true;

        let mut airlines = HashMap::new();
        airlines.insert(first_airline, airline);

        Self {
            airlines,
            airline_count: 1,
            consensus_threshold,
        }
    }

    pub fn airline_count(&self) -> usize {
        self.airline_count
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    pub fn is_airline(&self, address: &Address) -> bool {
        self.airline(address).is_some_and(|a| a.registered)
    }

    pub fn is_airline_funded(&self, address: &Address) -> bool {
        self.airline(address).is_some_and(|a| a.registered && a.funded)
    }

    /// Voters for a member or candidate (empty if unknown)
    pub fn get_airline_votes(&self, address: &Address) -> Vec<Address> {
        self.airline(address)
            .map(|a| a.votes.clone())
            .unwrap_or_default()
    }

    /// Votes a candidate needs at the current member count
    pub fn required_votes(&self) -> usize {
        self.airline_count.div_ceil(2)
    }

    pub fn require_funded_member(&self, address: &Address) -> LedgerResult<()> {
        if !self.is_airline_funded(address) {
            return Err(LedgerError::unauthorized(
                address,
                "is not a funded registered airline",
            ));
        }
        Ok(())
    }

    /// Register `candidate` directly or record `proposer`'s vote for it
    pub fn register(
        &mut self,
        candidate: Address,
        name: &str,
        proposer: &Address,
    ) -> LedgerResult<RegistrationOutcome> {
        self.require_funded_member(proposer)?;

        if self.is_airline(&candidate) {
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        let airline_count = self.airline_count;
        let bootstrapping = airline_count < self.consensus_threshold;
        let required = self.required_votes();

        let airline = self
            .airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::candidate(candidate, name));
        airline.add_vote(proposer.clone());
        let votes = airline.votes.len();

        if bootstrapping || votes * 2 >= airline_count {
            airline.registered = true;
            self.airline_count += 1;
            return Ok(RegistrationOutcome::Registered { votes });
        }

        Ok(RegistrationOutcome::Pending { votes, required })
    }

    /// Record a funding action of `amount` for a registered airline
    pub fn fund(
        &mut self,
        address: &Address,
        amount: Amount,
        minimum_stake: Amount,
    ) -> LedgerResult<FundingOutcome> {
        if !self.is_airline(address) {
            return Err(LedgerError::UnknownAirline(address.clone()));
        }
        if amount < minimum_stake {
            return Err(LedgerError::InsufficientFunds {
                required: minimum_stake,
                provided: amount,
            });
        }

        let airline = self
            .airlines
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAirline(address.clone()))?;
        let stake = airline
            .stake
            .checked_add(&amount)
            .ok_or(flightsure_core::AmountError::Overflow)?;

        airline.stake = stake;
        let newly_funded = !airline.funded;
        airline.funded = true;

        Ok(FundingOutcome { newly_funded, stake })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    /// Registry with `n` funded members a1..an
    fn registry_with_funded(n: usize) -> AirlineRegistry {
        let mut registry = AirlineRegistry::new(addr("a1"), "Air 1", 4);
        registry.fund(&addr("a1"), Amount::ether(10), Amount::ether(10)).unwrap();
        for i in 2..=n {
            let candidate = addr(&format!("a{i}"));
            for voter in 1..i {
                let outcome = registry
                    .register(candidate.clone(), "Air", &addr(&format!("a{voter}")))
                    .unwrap();
                if outcome.is_registered() {
                    break;
                }
            }
            registry.fund(&candidate, Amount::ether(10), Amount::ether(10)).unwrap();
        }
        registry
    }

    #[test]
    fn test_first_airline_registered_unfunded() {
        let registry = AirlineRegistry::new(addr("a1"), "Apple Air", 4);
        assert!(registry.is_airline(&addr("a1")));
        assert!(!registry.is_airline_funded(&addr("a1")));
        assert_eq!(registry.airline_count(), 1);
    }

    #[test]
    fn test_unfunded_proposer_rejected() {
        let mut registry = AirlineRegistry::new(addr("a1"), "Apple Air", 4);
        let result = registry.register(addr("a2"), "Air 2", &addr("a1"));
        assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
        assert!(registry.airline(&addr("a2")).is_none());
    }

    #[test]
    fn test_bootstrap_registers_immediately() {
        let mut registry = registry_with_funded(1);
        let outcome = registry.register(addr("a2"), "Air 2", &addr("a1")).unwrap();

        assert_eq!(outcome, RegistrationOutcome::Registered { votes: 1 });
        assert_eq!(registry.airline_count(), 2);
        assert!(registry.is_airline(&addr("a2")));
        assert!(!registry.is_airline_funded(&addr("a2")));
        assert_eq!(registry.get_airline_votes(&addr("a2")), vec![addr("a1")]);
    }

    #[test]
    fn test_fifth_airline_needs_two_votes() {
        let mut registry = registry_with_funded(4);
        assert_eq!(registry.airline_count(), 4);

        let outcome = registry.register(addr("a5"), "Air 5", &addr("a1")).unwrap();
        // 1 * 2 < 4
        assert_eq!(outcome, RegistrationOutcome::Pending { votes: 1, required: 2 });
        assert!(!registry.is_airline(&addr("a5")));

        let outcome = registry.register(addr("a5"), "Air 5", &addr("a2")).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered { votes: 2 });
        assert_eq!(registry.airline_count(), 5);
    }

    #[test]
    fn test_duplicate_vote_not_counted() {
        let mut registry = registry_with_funded(5);

        registry.register(addr("a6"), "Air 6", &addr("a1")).unwrap();
        let outcome = registry.register(addr("a6"), "Air 6", &addr("a1")).unwrap();

        assert_eq!(outcome, RegistrationOutcome::Pending { votes: 1, required: 3 });
        assert_eq!(registry.get_airline_votes(&addr("a6")).len(), 1);
        assert_eq!(registry.airline_count(), 5);
    }

    #[test]
    fn test_sixth_airline_needs_three_votes() {
        let mut registry = registry_with_funded(5);

        registry.register(addr("a6"), "Air 6", &addr("a1")).unwrap();
        registry.register(addr("a6"), "Air 6", &addr("a2")).unwrap();
        assert!(!registry.is_airline(&addr("a6")));

        let outcome = registry.register(addr("a6"), "Air 6", &addr("a3")).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered { votes: 3 });
        assert_eq!(registry.airline_count(), 6);
    }

    #[test]
    fn test_vote_for_member_is_noop() {
        let mut registry = registry_with_funded(4);
        let outcome = registry.register(addr("a2"), "Air 2", &addr("a3")).unwrap();

        assert_eq!(outcome, RegistrationOutcome::AlreadyRegistered);
        assert_eq!(registry.airline_count(), 4);
        assert_eq!(registry.get_airline_votes(&addr("a2")), vec![addr("a1")]);
    }

    #[test]
    fn test_funding_below_minimum_rejected() {
        let mut registry = AirlineRegistry::new(addr("a1"), "Apple Air", 4);
        let almost = Amount::ether(10).checked_sub(&Amount::wei(1)).unwrap();

        let result = registry.fund(&addr("a1"), almost, Amount::ether(10));
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert!(!registry.is_airline_funded(&addr("a1")));
        assert_eq!(registry.airline(&addr("a1")).unwrap().stake, Amount::ZERO);
    }

    #[test]
    fn test_funding_is_idempotent_on_flag() {
        let mut registry = AirlineRegistry::new(addr("a1"), "Apple Air", 4);

        let first = registry.fund(&addr("a1"), Amount::ether(10), Amount::ether(10)).unwrap();
        assert!(first.newly_funded);

        let second = registry.fund(&addr("a1"), Amount::ether(12), Amount::ether(10)).unwrap();
        assert!(!second.newly_funded);
        assert_eq!(second.stake, Amount::ether(22));
        assert!(registry.is_airline_funded(&addr("a1")));
    }

    #[test]
    fn test_funding_candidate_rejected() {
        let mut registry = registry_with_funded(4);
        registry.register(addr("a5"), "Air 5", &addr("a1")).unwrap();

        let result = registry.fund(&addr("a5"), Amount::ether(10), Amount::ether(10));
        assert!(matches!(result, Err(LedgerError::UnknownAirline(_))));
    }
}
