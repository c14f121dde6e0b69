//! Ledger records shared by the registry, escrow and consensus stores

use crate::{Address, Amount, RequestKey, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registry member or a candidate collecting votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub name: String,
    /// Full member (bootstrapped or voted in)
    pub registered: bool,
    /// Has posted the minimum stake in a single funding action
    pub funded: bool,
    /// Cumulative stake posted by this airline
    pub stake: Amount,
    /// Voters in the order they voted; never contains duplicates
    pub votes: Vec<Address>,
}

impl Airline {
    /// A candidate with no votes yet
    pub fn candidate(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            registered: false,
            funded: false,
            stake: Amount::ZERO,
            votes: Vec::new(),
        }
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.votes.contains(voter)
    }

    /// Add a vote (returns false if this voter already voted)
    pub fn add_vote(&mut self, voter: Address) -> bool {
        if self.has_voted(&voter) {
            return false;
        }
        self.votes.push(voter);
        true
    }
}

/// A registered status reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub address: Address,
    pub indexes: [u8; 3],
}

impl Oracle {
    pub fn has_index(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

/// Aggregation record for one (index, flight) status request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: RequestKey,
    /// Who asked for the status
    pub requester: Address,
    /// Responding oracles per reported status
    pub responses: BTreeMap<StatusCode, Vec<Address>>,
    /// Set exactly once, when quorum is reached
    pub final_status: Option<StatusCode>,
}

impl StatusRequest {
    pub fn open(key: RequestKey, requester: Address) -> Self {
        Self {
            key,
            requester,
            responses: BTreeMap::new(),
            final_status: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.final_status.is_some()
    }

    /// Number of distinct oracles that reported `status`
    pub fn response_count(&self, status: StatusCode) -> usize {
        self.responses.get(&status).map_or(0, Vec::len)
    }

    pub fn has_responded(&self, oracle: &Address, status: StatusCode) -> bool {
        self.responses
            .get(&status)
            .is_some_and(|oracles| oracles.contains(oracle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlightKey;

    #[test]
    fn test_duplicate_vote_rejected() {
        let mut airline = Airline::candidate(Address::new("0xa5"), "5th Air");
        assert!(airline.add_vote(Address::new("0xa1")));
        assert!(!airline.add_vote(Address::new("0xA1")));
        assert_eq!(airline.votes.len(), 1);
    }

    #[test]
    fn test_request_response_count() {
        let key = RequestKey::new(3, FlightKey::new("0xa1", "ND1309", 1));
        let mut request = StatusRequest::open(key, Address::new("0xowner"));
        assert_eq!(request.response_count(StatusCode::OnTime), 0);

        request
            .responses
            .entry(StatusCode::OnTime)
            .or_default()
            .push(Address::new("0xo1"));

        assert_eq!(request.response_count(StatusCode::OnTime), 1);
        assert!(request.has_responded(&Address::new("0xo1"), StatusCode::OnTime));
        assert!(!request.has_responded(&Address::new("0xo1"), StatusCode::LateAirline));
        assert!(!request.is_finalized());
    }
}
