//! FlightSure ledger facade
//!
//! The only entry point for external callers. Each operation:
//! 1. Checks the ledger is operational and that the facade itself is an
//!    authorized caller
//! 2. Validates caller identity and business rules
//! 3. Applies the whole state transition (or none of it)
//! 4. Emits notifications to registered listeners
//!
//! Settlement follows the same check-then-apply discipline: credits are
//! planned before the status request is finalized, so an overflow while
//! crediting rejects the response instead of leaving a settled flight with
//! unpaid insurees.

use flightsure_core::{Address, Airline, Amount, AmountError, FlightKey, RequestKey, StatusCode, StatusRequest};
use sha2::{Digest, Sha256};

use crate::config::LedgerConfig;
use crate::consensus::{OracleConsensus, ResponseOutcome};
use crate::error::{LedgerError, LedgerResult};
use crate::escrow::{Credit, InsuranceEscrow};
use crate::event::{EventListener, LedgerEvent};
use crate::gate::AccessGate;
use crate::index::IndexSource;
use crate::payout::{Payout, PayoutLog, PayoutSink};
use crate::registry::{AirlineRegistry, FundingOutcome, RegistrationOutcome};

/// Identity the ledger deployed by `owner` acts under
pub fn ledger_address(owner: &Address) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"flightsure-ledger:");
    hasher.update(owner.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    Address::new(format!("0x{}", &digest[..40]))
}

pub struct FlightSuretyLedger {
    config: LedgerConfig,
    identity: Address,
    gate: AccessGate,
    registry: AirlineRegistry,
    escrow: InsuranceEscrow,
    consensus: OracleConsensus,
    /// Stakes + premiums + oracle fees - payouts
    treasury: Amount,
    listeners: Vec<Box<dyn EventListener>>,
    payout_sink: Box<dyn PayoutSink>,
}

impl FlightSuretyLedger {
    /// Deploy a ledger owned by `owner` with `first_airline` as its only
    /// (unfunded) member. Oracle indices come from the configured source.
    pub fn new(
        config: LedgerConfig,
        owner: Address,
        first_airline: Address,
        first_airline_name: &str,
    ) -> LedgerResult<Self> {
        let index_source = config.index_source.build(config.index_seed);
        Self::with_index_source(config, owner, first_airline, first_airline_name, index_source)
    }

    /// Like `new`, with an explicit oracle index source
    pub fn with_index_source(
        config: LedgerConfig,
        owner: Address,
        first_airline: Address,
        first_airline_name: &str,
        index_source: Box<dyn IndexSource>,
    ) -> LedgerResult<Self> {
        if let Some(reason) = config.problem() {
            return Err(LedgerError::InvalidConfig(reason));
        }
        let identity = ledger_address(&owner);

        let mut gate = AccessGate::new(owner.clone());
        gate.authorize_caller(identity.clone(), &owner)?;

        let registry = AirlineRegistry::new(
            first_airline.clone(),
            first_airline_name,
            config.consensus_threshold,
        );
        let consensus =
            OracleConsensus::new(index_source, config.index_space, config.min_responses);

        tracing::info!(
            owner = %owner,
            ledger = %identity,
            first_airline = %first_airline,
            "Ledger deployed"
        );

        Ok(Self {
            config,
            identity,
            gate,
            registry,
            escrow: InsuranceEscrow::new(),
            consensus,
            treasury: Amount::ZERO,
            listeners: Vec::new(),
            payout_sink: Box::new(PayoutLog::new()),
        })
    }

    /// Replace the payout destination
    pub fn with_payout_sink(mut self, sink: Box<dyn PayoutSink>) -> Self {
        self.payout_sink = sink;
        self
    }

    /// Register a listener; it receives every event emitted from now on
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        tracing::debug!(listener = listener.name(), "Listener registered");
        self.listeners.push(listener);
    }

    fn emit(&mut self, event: LedgerEvent) {
        tracing::trace!(event = event.name(), "Emitting ledger event");
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    /// Every mutating operation passes through here first
    fn guard(&self) -> LedgerResult<()> {
        self.gate.require_operational()?;
        self.gate.require_authorized_caller(&self.identity)
    }

    // === Access control ===

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn identity(&self) -> &Address {
        &self.identity
    }

    pub fn owner(&self) -> &Address {
        self.gate.owner()
    }

    pub fn is_operational(&self) -> bool {
        self.gate.is_operational()
    }

    pub fn set_operating_status(&mut self, operational: bool, caller: &Address) -> LedgerResult<()> {
        self.gate.set_operating_status(operational, caller)?;
        tracing::info!(operational, by = %caller, "Operating status set");
        self.emit(LedgerEvent::OperatingStatusChanged {
            operational,
            by: caller.clone(),
        });
        Ok(())
    }

    pub fn authorize_caller(&mut self, identity: Address, caller: &Address) -> LedgerResult<()> {
        self.gate.authorize_caller(identity.clone(), caller)?;
        tracing::info!(identity = %identity, "Caller authorized");
        Ok(())
    }

    /// Deauthorizing the ledger's own identity disables every mutation
    pub fn deauthorize_caller(&mut self, identity: &Address, caller: &Address) -> LedgerResult<()> {
        self.gate.deauthorize_caller(identity, caller)?;
        tracing::warn!(identity = %identity, "Caller deauthorized");
        Ok(())
    }

    pub fn is_authorized_caller(&self, identity: &Address) -> bool {
        self.gate.is_authorized_caller(identity)
    }

    // === Airlines ===

    pub fn airline_count(&self) -> usize {
        self.registry.airline_count()
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.registry.airline(address)
    }

    pub fn is_airline(&self, address: &Address) -> bool {
        self.registry.is_airline(address)
    }

    pub fn is_airline_funded(&self, address: &Address) -> bool {
        self.registry.is_airline_funded(address)
    }

    pub fn get_airline_votes(&self, address: &Address) -> Vec<Address> {
        self.registry.get_airline_votes(address)
    }

    /// Register `candidate` (bootstrap) or vote for it (consensus)
    pub fn register_airline(
        &mut self,
        candidate: Address,
        name: &str,
        caller: &Address,
    ) -> LedgerResult<RegistrationOutcome> {
        self.guard()?;

        let repeat_vote = self
            .registry
            .airline(&candidate)
            .is_some_and(|airline| !airline.registered && airline.has_voted(caller));

        let outcome = self.registry.register(candidate.clone(), name, caller)?;

        match outcome {
            RegistrationOutcome::Registered { votes } => {
                tracing::info!(
                    airline = %candidate,
                    votes,
                    airline_count = self.registry.airline_count(),
                    "Airline registered"
                );
                self.emit(LedgerEvent::AirlineRegistered {
                    airline: candidate,
                    name: name.to_string(),
                    votes,
                });
            }
            RegistrationOutcome::Pending { votes, required } if !repeat_vote => {
                tracing::info!(airline = %candidate, voter = %caller, votes, required, "Airline vote recorded");
                self.emit(LedgerEvent::AirlineVoted {
                    candidate,
                    voter: caller.clone(),
                    votes,
                    required,
                });
            }
            RegistrationOutcome::Pending { .. } => {
                tracing::debug!(airline = %candidate, voter = %caller, "Repeat vote ignored");
            }
            RegistrationOutcome::AlreadyRegistered => {
                tracing::debug!(airline = %candidate, "Vote for existing member ignored");
            }
        }

        Ok(outcome)
    }

    /// Post `amount` of stake for `airline`
    pub fn fund_airline(
        &mut self,
        airline: &Address,
        amount: Amount,
        caller: &Address,
    ) -> LedgerResult<FundingOutcome> {
        self.guard()?;
        let treasury = self.treasury.checked_add(&amount).ok_or(AmountError::Overflow)?;

        let outcome = self
            .registry
            .fund(airline, amount, self.config.minimum_stake)?;
        self.treasury = treasury;

        tracing::info!(
            airline = %airline,
            funder = %caller,
            amount = %amount,
            stake = %outcome.stake,
            newly_funded = outcome.newly_funded,
            "Airline funded"
        );
        self.emit(LedgerEvent::AirlineFunded {
            airline: airline.clone(),
            amount,
            stake: outcome.stake,
            newly_funded: outcome.newly_funded,
        });

        Ok(outcome)
    }

    // === Insurance ===

    pub fn get_insurance_purchase_amount(&self, passenger: &Address, flight: &FlightKey) -> Amount {
        self.escrow.get_insurance_purchase_amount(passenger, flight)
    }

    pub fn get_passenger_balance(&self, passenger: &Address) -> Amount {
        self.escrow.get_passenger_balance(passenger)
    }

    pub fn insurees(&self, flight: &FlightKey) -> Vec<Address> {
        self.escrow.insurees(flight)
    }

    pub fn treasury(&self) -> Amount {
        self.treasury
    }

    /// Buy `amount` of cover on `flight`; returns the caller's total for it
    pub fn purchase_insurance(
        &mut self,
        flight: &FlightKey,
        amount: Amount,
        caller: &Address,
    ) -> LedgerResult<Amount> {
        self.guard()?;
        if !self.registry.is_airline(&flight.airline) {
            return Err(LedgerError::UnknownAirline(flight.airline.clone()));
        }
        self.consensus.require_unresolved(flight)?;
        let treasury = self.treasury.checked_add(&amount).ok_or(AmountError::Overflow)?;

        let total = self
            .escrow
            .purchase(caller, flight, amount, self.config.max_purchase)?;
        self.treasury = treasury;

        tracing::info!(passenger = %caller, flight = %flight, amount = %amount, total = %total, "Insurance purchased");
        self.emit(LedgerEvent::InsurancePurchased {
            passenger: caller.clone(),
            flight: flight.clone(),
            amount,
            total,
        });

        Ok(total)
    }

    /// Withdraw the caller's whole balance; returns the amount paid
    ///
    /// The balance is zeroed before the payout reaches the sink.
    pub fn pay(&mut self, passenger: &Address, caller: &Address) -> LedgerResult<Amount> {
        self.guard()?;
        if caller != passenger {
            return Err(LedgerError::unauthorized(caller, "may only withdraw its own balance"));
        }

        let balance = self.escrow.get_passenger_balance(passenger);
        if balance.is_zero() {
            tracing::debug!(passenger = %passenger, "Nothing to pay");
            return Ok(Amount::ZERO);
        }
        let treasury = self
            .treasury
            .checked_sub(&balance)
            .ok_or(LedgerError::InsufficientFunds {
                required: balance,
                provided: self.treasury,
            })?;

        let amount = self.escrow.take_balance(passenger);
        self.treasury = treasury;

        tracing::info!(passenger = %passenger, amount = %amount, "Passenger paid");
        self.payout_sink.transfer(&Payout::new(passenger.clone(), amount));
        self.emit(LedgerEvent::PassengerPaid {
            passenger: passenger.clone(),
            amount,
        });

        Ok(amount)
    }

    // === Oracles ===

    pub fn registration_fee(&self) -> Amount {
        self.config.registration_fee
    }

    pub fn is_oracle_registered(&self, oracle: &Address) -> bool {
        self.consensus.is_registered(oracle)
    }

    pub fn oracle_count(&self) -> usize {
        self.consensus.oracle_count()
    }

    pub fn register_oracle(&mut self, fee: Amount, caller: &Address) -> LedgerResult<[u8; 3]> {
        self.guard()?;
        let treasury = self.treasury.checked_add(&fee).ok_or(AmountError::Overflow)?;

        let indexes = self
            .consensus
            .register_oracle(caller, fee, self.config.registration_fee)?;
        self.treasury = treasury;

        tracing::info!(oracle = %caller, ?indexes, "Oracle registered");
        self.emit(LedgerEvent::OracleRegistered {
            oracle: caller.clone(),
            indexes,
        });

        Ok(indexes)
    }

    pub fn get_my_indexes(&self, caller: &Address) -> LedgerResult<[u8; 3]> {
        self.consensus.get_my_indexes(caller)
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.consensus.flight_status(flight)
    }

    pub fn request(&self, index: u8, flight: &FlightKey) -> Option<&StatusRequest> {
        self.consensus.request(&RequestKey::new(index, flight.clone()))
    }

    pub fn open_requests(&self) -> Vec<&StatusRequest> {
        self.consensus.open_requests()
    }

    /// Open a status request for `flight`; returns the index it was sent to
    pub fn fetch_flight_status(&mut self, flight: &FlightKey, caller: &Address) -> LedgerResult<u8> {
        self.guard()?;

        let key = self.consensus.open_request(flight, caller)?;

        tracing::info!(index = key.index, flight = %flight, requester = %caller, "Status requested");
        self.emit(LedgerEvent::OracleRequest {
            index: key.index,
            flight: flight.clone(),
        });

        Ok(key.index)
    }

    pub fn submit_oracle_response(
        &mut self,
        index: u8,
        flight: &FlightKey,
        status_code: u8,
        caller: &Address,
    ) -> LedgerResult<ResponseOutcome> {
        self.guard()?;
        let status = StatusCode::try_from(status_code)?;

        let key = RequestKey::new(index, flight.clone());
        let plan = self.consensus.check_response(&key, status, caller)?;
        let settlement = if plan.finalizes {
            self.plan_settlement(flight, status)?
        } else {
            Settlement::default()
        };

        let outcome = self.consensus.apply_response(&plan);

        // Repeats change nothing and are not reported again
        if plan.is_new {
            tracing::debug!(
                index,
                flight = %flight,
                status = %status,
                oracle = %caller,
                responses = plan.responses,
                "Oracle response recorded"
            );
            self.emit(LedgerEvent::OracleReport {
                index,
                flight: flight.clone(),
                status,
                oracle: caller.clone(),
            });
        }

        if outcome.is_finalized() {
            self.settle(flight, status, settlement);
        }

        Ok(outcome)
    }

    /// Owner-forced settlement of `flight`
    pub fn process_flight_status(
        &mut self,
        flight: &FlightKey,
        status_code: u8,
        caller: &Address,
    ) -> LedgerResult<()> {
        self.guard()?;
        self.gate.require_owner(caller)?;
        let status = StatusCode::try_from(status_code)?;
        self.consensus.require_unresolved(flight)?;

        let settlement = self.plan_settlement(flight, status)?;
        self.consensus.finalize(flight, status);

        tracing::warn!(flight = %flight, status = %status, "Flight status forced by owner");
        self.settle(flight, status, settlement);

        Ok(())
    }

    // === Settlement ===

    fn plan_settlement(&self, flight: &FlightKey, status: StatusCode) -> LedgerResult<Settlement> {
        if !self.config.pays_out(status) {
            return Ok(Settlement::default());
        }
        let credits = self.escrow.plan_credits(flight, self.config.payout_multiplier)?;
        let total = credits.iter().try_fold(Amount::ZERO, |total, credit| {
            total.checked_add(&credit.credited).ok_or(AmountError::Overflow)
        })?;
        Ok(Settlement { credits, total })
    }

    /// Runs once per flight, right after it resolves
    fn settle(&mut self, flight: &FlightKey, status: StatusCode, settlement: Settlement) {
        tracing::info!(flight = %flight, status = %status, "Flight status finalized");
        self.emit(LedgerEvent::FlightStatusInfo {
            flight: flight.clone(),
            status,
        });

        if !self.config.pays_out(status) {
            return;
        }

        let Settlement { credits, total } = settlement;
        self.escrow.apply_credits(flight, &credits);

        tracing::info!(
            flight = %flight,
            passengers = credits.len(),
            total = %total,
            "Insurees credited"
        );
        self.emit(LedgerEvent::InsureesCredited {
            flight: flight.clone(),
            status,
            passengers: credits.len(),
            total,
        });
    }
}

/// Credits planned before a flight resolves, with their checked sum
#[derive(Debug, Default)]
struct Settlement {
    credits: Vec<Credit>,
    total: Amount,
}
