//! Integration tests for the FlightSure ledger
//!
//! These tests drive the facade end to end: airline governance, insurance
//! purchase, oracle consensus, settlement and withdrawal.

use flightsure_core::{Address, Amount, FlightKey, StatusCode};
use flightsure_ledger::{
    FlightSuretyLedger, LedgerConfig, LedgerError, PayoutLog, RecordingListener,
    RegistrationOutcome, ResponseOutcome, SequenceIndexSource,
};
use rust_decimal_macros::dec;

fn owner() -> Address {
    Address::new("0x627306090abaB3A6e1400e9345bC60c78a8BEf57")
}

fn airline(i: usize) -> Address {
    Address::new(format!("0xa{i}"))
}

fn passenger(i: usize) -> Address {
    Address::new(format!("0xp{i}"))
}

fn oracle(i: usize) -> Address {
    Address::new(format!("0xo{i}"))
}

fn flight() -> FlightKey {
    FlightKey::new(airline(1), "ND1309", 1_572_562_800)
}

/// Ledger whose oracles all hold [1, 2, 3] and whose requests land on index 1
fn ledger() -> FlightSuretyLedger {
    FlightSuretyLedger::with_index_source(
        LedgerConfig::default(),
        owner(),
        airline(1),
        "Apple Air",
        Box::new(SequenceIndexSource::new(vec![1, 2, 3])),
    )
    .unwrap()
}

/// Ledger with `n` funded airlines a1..an
fn ledger_with_airlines(n: usize) -> FlightSuretyLedger {
    let mut ledger = ledger();
    ledger.fund_airline(&airline(1), Amount::ether(10), &airline(1)).unwrap();
    for i in 2..=n {
        for voter in 1..i {
            let outcome = ledger
                .register_airline(airline(i), &format!("Air {i}"), &airline(voter))
                .unwrap();
            if outcome.is_registered() {
                break;
            }
        }
        ledger.fund_airline(&airline(i), Amount::ether(10), &airline(i)).unwrap();
    }
    ledger
}

fn register_oracles(ledger: &mut FlightSuretyLedger, n: usize) {
    for i in 1..=n {
        ledger.register_oracle(Amount::ether(1), &oracle(i)).unwrap();
    }
}

fn half_ether() -> Amount {
    Amount::new(dec!(0.5)).unwrap()
}

/// Test: first airline is registered at deployment but cannot act until funded
#[test]
fn test_unfunded_airline_cannot_register() {
    let mut ledger = ledger();
    assert!(ledger.is_airline(&airline(1)));

    let result = ledger.register_airline(airline(2), "Air 2", &airline(1));
    assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
    assert!(!ledger.is_airline(&airline(2)));
    assert_eq!(ledger.airline_count(), 1);
}

/// Test: one proposer suffices while fewer than four airlines exist
#[test]
fn test_bootstrap_registration() {
    let mut ledger = ledger_with_airlines(1);

    for i in 2..=4 {
        let before = ledger.airline_count();
        let outcome = ledger
            .register_airline(airline(i), "Air", &airline(1))
            .unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered { votes: 1 });
        assert_eq!(ledger.airline_count(), before + 1);
        assert!(!ledger.is_airline_funded(&airline(i)));
    }
}

/// Test: 4 funded airlines; the 5th is voted in by A then B
#[test]
fn test_fifth_airline_by_consensus() {
    let mut ledger = ledger_with_airlines(4);

    // 1. First vote leaves the candidate pending
    let outcome = ledger.register_airline(airline(5), "Air 5", &airline(1)).unwrap();
    assert!(!outcome.is_registered());
    assert!(!ledger.is_airline(&airline(5)));
    assert_eq!(ledger.get_airline_votes(&airline(5)), vec![airline(1)]);

    // 2. A repeat vote changes nothing
    ledger.register_airline(airline(5), "Air 5", &airline(1)).unwrap();
    assert_eq!(ledger.get_airline_votes(&airline(5)).len(), 1);

    // 3. Second distinct vote registers it
    let outcome = ledger.register_airline(airline(5), "Air 5", &airline(2)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered { votes: 2 });
    assert_eq!(ledger.airline_count(), 5);

    // 4. Further votes never re-increment the count
    let outcome = ledger.register_airline(airline(5), "Air 5", &airline(3)).unwrap();
    assert_eq!(outcome, RegistrationOutcome::AlreadyRegistered);
    assert_eq!(ledger.airline_count(), 5);
}

/// Test: funding needs the minimum stake in a single action
#[test]
fn test_funding_threshold() {
    let mut ledger = ledger_with_airlines(1);
    ledger.register_airline(airline(2), "Air 2", &airline(1)).unwrap();

    let almost = Amount::ether(10).checked_sub(&Amount::wei(1)).unwrap();
    let result = ledger.fund_airline(&airline(2), almost, &airline(2));
    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
    assert!(!ledger.is_airline_funded(&airline(2)));

    ledger.fund_airline(&airline(2), Amount::ether(10), &airline(2)).unwrap();
    assert!(ledger.is_airline_funded(&airline(2)));

    // Repeat funding is accepted and keeps the flag
    let outcome = ledger.fund_airline(&airline(2), Amount::ether(10), &airline(2)).unwrap();
    assert!(!outcome.newly_funded);
    assert!(ledger.is_airline_funded(&airline(2)));
}

/// Test: purchases accumulate up to 1 ether per passenger and flight
#[test]
fn test_purchase_cap() {
    let mut ledger = ledger_with_airlines(1);

    ledger.purchase_insurance(&flight(), half_ether(), &passenger(1)).unwrap();
    let total = ledger.purchase_insurance(&flight(), half_ether(), &passenger(1)).unwrap();
    assert_eq!(total, Amount::ether(1));

    let result = ledger.purchase_insurance(&flight(), Amount::wei(1), &passenger(1));
    assert!(matches!(result, Err(LedgerError::LimitExceeded { .. })));
    assert_eq!(
        ledger.get_insurance_purchase_amount(&passenger(1), &flight()),
        Amount::ether(1)
    );
}

/// Test: request → three matching responses → credit → withdrawal
#[test]
fn test_full_settlement_workflow() {
    let payouts = PayoutLog::new();
    let mut ledger = ledger_with_airlines(1).with_payout_sink(Box::new(payouts.clone()));
    let events = RecordingListener::new();
    ledger.add_listener(Box::new(events.clone()));
    register_oracles(&mut ledger, 4);

    // 1. Two passengers insure the same flight
    ledger.purchase_insurance(&flight(), Amount::ether(1), &passenger(1)).unwrap();
    ledger.purchase_insurance(&flight(), half_ether(), &passenger(2)).unwrap();

    // 2. Open a request
    let index = ledger.fetch_flight_status(&flight(), &passenger(1)).unwrap();
    assert_eq!(index, 1);
    assert_eq!(ledger.open_requests().len(), 1);

    // 3. Two responses are not enough
    for i in 1..=2 {
        let outcome = ledger
            .submit_oracle_response(index, &flight(), 20, &oracle(i))
            .unwrap();
        assert!(!outcome.is_finalized());
    }
    assert_eq!(ledger.get_passenger_balance(&passenger(1)), Amount::ZERO);

    // 4. The third finalizes and credits 1.5x
    let outcome = ledger
        .submit_oracle_response(index, &flight(), 20, &oracle(3))
        .unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Finalized { status: StatusCode::LateAirline, responses: 3 }
    );
    assert_eq!(ledger.get_passenger_balance(&passenger(1)).value(), dec!(1.5));
    assert_eq!(ledger.get_passenger_balance(&passenger(2)).value(), dec!(0.75));
    assert_eq!(
        ledger.get_insurance_purchase_amount(&passenger(1), &flight()),
        Amount::ZERO
    );
    assert!(ledger.open_requests().is_empty());

    // 5. A late response is rejected and credits nothing
    let late = ledger.submit_oracle_response(index, &flight(), 20, &oracle(4));
    assert!(matches!(late, Err(LedgerError::RequestClosed(_))));
    assert_eq!(ledger.get_passenger_balance(&passenger(1)).value(), dec!(1.5));

    // 6. Withdraw
    let paid = ledger.pay(&passenger(1), &passenger(1)).unwrap();
    assert_eq!(paid.value(), dec!(1.5));
    assert_eq!(ledger.get_passenger_balance(&passenger(1)), Amount::ZERO);
    assert_eq!(ledger.pay(&passenger(1), &passenger(1)).unwrap(), Amount::ZERO);
    assert_eq!(payouts.payouts().len(), 1);

    let credited = events
        .names()
        .iter()
        .filter(|name| **name == "InsureesCredited")
        .count();
    assert_eq!(credited, 1);
}

/// Test: two requests for one flight settle it exactly once
#[test]
fn test_flight_credited_once_across_indices() {
    let mut ledger = FlightSuretyLedger::with_index_source(
        LedgerConfig::default(),
        owner(),
        airline(1),
        "Apple Air",
        // Oracles: [1, 2, 3] each; requests: 1 then 2
        Box::new(SequenceIndexSource::new(vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2])),
    )
    .unwrap();
    ledger.fund_airline(&airline(1), Amount::ether(10), &airline(1)).unwrap();
    register_oracles(&mut ledger, 3);
    ledger.purchase_insurance(&flight(), Amount::ether(1), &passenger(1)).unwrap();

    let first = ledger.fetch_flight_status(&flight(), &passenger(1)).unwrap();
    let second = ledger.fetch_flight_status(&flight(), &passenger(1)).unwrap();
    assert_ne!(first, second);

    for i in 1..=3 {
        ledger.submit_oracle_response(first, &flight(), 20, &oracle(i)).unwrap();
    }

    // The sibling request closed with the flight
    let result = ledger.submit_oracle_response(second, &flight(), 20, &oracle(1));
    assert!(matches!(result, Err(LedgerError::RequestClosed(_))));
    assert_eq!(
        ledger.request(second, &flight()).unwrap().final_status,
        Some(StatusCode::LateAirline)
    );
    assert_eq!(ledger.get_passenger_balance(&passenger(1)).value(), dec!(1.5));
}

/// Test: oracle registration fee, re-registration and index checks
#[test]
fn test_oracle_rules() {
    let mut ledger = ledger_with_airlines(1);

    let short = Amount::ether(1).checked_sub(&Amount::wei(1)).unwrap();
    let result = ledger.register_oracle(short, &oracle(1));
    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
    assert_eq!(
        ledger.get_my_indexes(&oracle(1)),
        Err(LedgerError::NotRegistered(oracle(1)))
    );

    let indexes = ledger.register_oracle(Amount::ether(1), &oracle(1)).unwrap();
    assert_eq!(ledger.get_my_indexes(&oracle(1)).unwrap(), indexes);
    assert_eq!(
        ledger.register_oracle(Amount::ether(1), &oracle(1)),
        Err(LedgerError::AlreadyRegistered(oracle(1)))
    );

    let index = ledger.fetch_flight_status(&flight(), &owner()).unwrap();

    // Index 9 is not one of [1, 2, 3]
    let result = ledger.submit_oracle_response(9, &flight(), 20, &oracle(1));
    assert!(matches!(result, Err(LedgerError::IndexMismatch { index: 9, .. })));

    let result = ledger.submit_oracle_response(index, &flight(), 20, &oracle(2));
    assert_eq!(result, Err(LedgerError::NotRegistered(oracle(2))));
}

/// Test: only the passenger may withdraw their balance
#[test]
fn test_pay_is_self_only() {
    let mut ledger = ledger_with_airlines(1);
    ledger.purchase_insurance(&flight(), Amount::ether(1), &passenger(1)).unwrap();
    ledger.process_flight_status(&flight(), 20, &owner()).unwrap();

    let result = ledger.pay(&passenger(1), &passenger(2));
    assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
    assert_eq!(ledger.get_passenger_balance(&passenger(1)).value(), dec!(1.5));
}

/// Test: pausing blocks mutations; unpausing restores them
#[test]
fn test_operational_switch() {
    let mut ledger = ledger_with_airlines(1);

    let result = ledger.set_operating_status(false, &passenger(1));
    assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
    assert!(ledger.is_operational());

    ledger.set_operating_status(false, &owner()).unwrap();
    assert_eq!(
        ledger.register_airline(airline(2), "Air 2", &airline(1)),
        Err(LedgerError::NotOperational)
    );
    assert_eq!(
        ledger.purchase_insurance(&flight(), Amount::ether(1), &passenger(1)),
        Err(LedgerError::NotOperational)
    );
    assert!(!ledger.is_airline(&airline(2)));

    ledger.set_operating_status(true, &owner()).unwrap();
    let outcome = ledger.register_airline(airline(2), "Air 2", &airline(1)).unwrap();
    assert!(outcome.is_registered());
}

/// Test: default configuration from `LedgerConfig::default` matches the
/// deployed constants
#[test]
fn test_default_constants() {
    let ledger = ledger();
    assert_eq!(ledger.registration_fee(), Amount::ether(1));
    assert_eq!(ledger.config().min_responses, 3);
    assert_eq!(ledger.config().minimum_stake, Amount::ether(10));
}
