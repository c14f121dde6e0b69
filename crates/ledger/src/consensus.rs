//! Oracle consensus - registration, status requests and quorum finalization
//!
//! Each status request moves `Open -> Finalized` exactly once. Responses are
//! validated with `check_response` (no mutation) and then applied with
//! `apply_response`, so the caller can prepare everything a finalization
//! triggers before any state changes.
//!
//! Once a flight resolves, every request for it is closed with the same
//! final status; later responses and fetches are rejected.

use flightsure_core::{Address, Amount, FlightKey, Oracle, RequestKey, StatusCode, StatusRequest};
use std::collections::HashMap;

use crate::error::{LedgerError, LedgerResult};
use crate::index::{draw_distinct, IndexSource};

/// A validated, not yet applied, oracle response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePlan {
    pub key: RequestKey,
    pub oracle: Address,
    pub status: StatusCode,
    /// False when the oracle already reported this status (idempotent repeat)
    pub is_new: bool,
    /// Matching responses once applied
    pub responses: usize,
    /// Applying this response reaches quorum
    pub finalizes: bool,
}

/// What an applied response did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Recorded; request still open
    Recorded { status: StatusCode, responses: usize },
    /// Quorum reached by this response; the flight is resolved
    Finalized { status: StatusCode, responses: usize },
}

impl ResponseOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, ResponseOutcome::Finalized { .. })
    }
}

pub struct OracleConsensus {
    oracles: HashMap<Address, Oracle>,
    requests: HashMap<RequestKey, StatusRequest>,
    resolved: HashMap<FlightKey, StatusCode>,
    index_source: Box<dyn IndexSource>,
    index_space: u8,
    min_responses: usize,
}

impl OracleConsensus {
    pub fn new(index_source: Box<dyn IndexSource>, index_space: u8, min_responses: usize) -> Self {
        Self {
            oracles: HashMap::new(),
            requests: HashMap::new(),
            resolved: HashMap::new(),
            index_source,
            index_space,
            min_responses,
        }
    }

    // === Oracles ===

    pub fn is_registered(&self, oracle: &Address) -> bool {
        self.oracles.contains_key(oracle)
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Register `from` and assign its three indices
    pub fn register_oracle(
        &mut self,
        from: &Address,
        fee: Amount,
        registration_fee: Amount,
    ) -> LedgerResult<[u8; 3]> {
        if self.is_registered(from) {
            return Err(LedgerError::AlreadyRegistered(from.clone()));
        }
        if fee < registration_fee {
            return Err(LedgerError::InsufficientFunds {
                required: registration_fee,
                provided: fee,
            });
        }

        let indexes = draw_distinct(self.index_source.as_mut(), from, self.index_space);
        self.oracles.insert(
            from.clone(),
            Oracle {
                address: from.clone(),
                indexes,
            },
        );
        Ok(indexes)
    }

    pub fn get_my_indexes(&self, from: &Address) -> LedgerResult<[u8; 3]> {
        self.oracles
            .get(from)
            .map(|oracle| oracle.indexes)
            .ok_or_else(|| LedgerError::NotRegistered(from.clone()))
    }

    // === Requests ===

    pub fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.resolved.get(flight).copied()
    }

    pub fn request(&self, key: &RequestKey) -> Option<&StatusRequest> {
        self.requests.get(key)
    }

    /// Requests still waiting for quorum
    pub fn open_requests(&self) -> Vec<&StatusRequest> {
        let mut open: Vec<_> = self
            .requests
            .values()
            .filter(|request| !request.is_finalized())
            .collect();
        open.sort_by(|a, b| a.key.cmp(&b.key));
        open
    }

    pub fn require_unresolved(&self, flight: &FlightKey) -> LedgerResult<()> {
        if let Some(status) = self.flight_status(flight) {
            return Err(LedgerError::FlightSettled {
                flight: flight.clone(),
                status,
            });
        }
        Ok(())
    }

    /// Draw an index and open (or reuse) the request for `flight` there
    pub fn open_request(&mut self, flight: &FlightKey, requester: &Address) -> LedgerResult<RequestKey> {
        self.require_unresolved(flight)?;

        let index = self.index_source.draw(requester, self.index_space);
        let key = RequestKey::new(index, flight.clone());
        self.requests
            .entry(key.clone())
            .or_insert_with(|| StatusRequest::open(key.clone(), requester.clone()));
        Ok(key)
    }

    /// Validate a response without recording it
    pub fn check_response(
        &self,
        key: &RequestKey,
        status: StatusCode,
        from: &Address,
    ) -> LedgerResult<ResponsePlan> {
        let oracle = self
            .oracles
            .get(from)
            .ok_or_else(|| LedgerError::NotRegistered(from.clone()))?;
        if !oracle.has_index(key.index) {
            return Err(LedgerError::IndexMismatch {
                oracle: from.clone(),
                index: key.index,
            });
        }

        let request = self
            .requests
            .get(key)
            .filter(|request| !request.is_finalized())
            .ok_or_else(|| LedgerError::RequestClosed(key.clone()))?;

        let is_new = !request.has_responded(from, status);
        let responses = request.response_count(status) + usize::from(is_new);

        Ok(ResponsePlan {
            key: key.clone(),
            oracle: from.clone(),
            status,
            is_new,
            responses,
            finalizes: responses >= self.min_responses,
        })
    }

    /// Record a response validated by `check_response`
    pub fn apply_response(&mut self, plan: &ResponsePlan) -> ResponseOutcome {
        if let Some(request) = self.requests.get_mut(&plan.key) {
            if plan.is_new {
                request
                    .responses
                    .entry(plan.status)
                    .or_default()
                    .push(plan.oracle.clone());
            }
        }

        if plan.finalizes {
            self.finalize(&plan.key.flight, plan.status);
            ResponseOutcome::Finalized {
                status: plan.status,
                responses: plan.responses,
            }
        } else {
            ResponseOutcome::Recorded {
                status: plan.status,
                responses: plan.responses,
            }
        }
    }

    /// Resolve `flight` and close every request for it
    ///
    /// Callers check `require_unresolved` first; a resolved flight keeps
    /// its original status.
    pub fn finalize(&mut self, flight: &FlightKey, status: StatusCode) {
        if self.resolved.contains_key(flight) {
            return;
        }
        self.resolved.insert(flight.clone(), status);

        for request in self.requests.values_mut() {
            if &request.key.flight == flight && request.final_status.is_none() {
                request.final_status = Some(status);
            }
        }
    }
}
