//! Insurance escrow - premiums per (passenger, flight) and withdrawable credit

use flightsure_core::{Address, Amount, AmountError, FlightKey};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::error::{LedgerError, LedgerResult};

/// One passenger's payout from a settled flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub passenger: Address,
    /// Premium consumed by the payout
    pub premium: Amount,
    /// Amount added to the passenger's balance
    pub credited: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct InsuranceEscrow {
    /// Flight -> passenger -> premium paid (ordered so credits are deterministic)
    purchases: HashMap<FlightKey, BTreeMap<Address, Amount>>,
    /// Passenger -> withdrawable credit
    balances: HashMap<Address, Amount>,
}

impl InsuranceEscrow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_insurance_purchase_amount(&self, passenger: &Address, flight: &FlightKey) -> Amount {
        self.purchases
            .get(flight)
            .and_then(|insurees| insurees.get(passenger))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn get_passenger_balance(&self, passenger: &Address) -> Amount {
        self.balances.get(passenger).copied().unwrap_or(Amount::ZERO)
    }

    /// Passengers holding a non-zero purchase on `flight`
    pub fn insurees(&self, flight: &FlightKey) -> Vec<Address> {
        self.purchases
            .get(flight)
            .map(|insurees| insurees.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Add `amount` to the passenger's purchase; the running total may not
    /// exceed `max_purchase`. Returns the new total.
    pub fn purchase(
        &mut self,
        passenger: &Address,
        flight: &FlightKey,
        amount: Amount,
        max_purchase: Amount,
    ) -> LedgerResult<Amount> {
        if amount.is_zero() {
            return Err(LedgerError::InsufficientFunds {
                required: Amount::wei(1),
                provided: amount,
            });
        }

        let current = self.get_insurance_purchase_amount(passenger, flight);
        let total = current.checked_add(&amount).ok_or(AmountError::Overflow)?;
        if total > max_purchase {
            return Err(LedgerError::LimitExceeded {
                limit: max_purchase,
                attempted: total,
            });
        }

        self.purchases
            .entry(flight.clone())
            .or_default()
            .insert(passenger.clone(), total);
        Ok(total)
    }

    /// Compute the credits settling `flight` at `multiplier` without
    /// touching any state. Fails on overflow.
    pub fn plan_credits(&self, flight: &FlightKey, multiplier: Decimal) -> LedgerResult<Vec<Credit>> {
        let Some(insurees) = self.purchases.get(flight) else {
            return Ok(Vec::new());
        };

        let mut credits = Vec::with_capacity(insurees.len());
        for (passenger, premium) in insurees {
            if premium.is_zero() {
                continue;
            }
            let credited = premium.checked_mul(multiplier).ok_or(AmountError::Overflow)?;
            // Balance must still fit after the credit lands
            self.get_passenger_balance(passenger)
                .checked_add(&credited)
                .ok_or(AmountError::Overflow)?;

            credits.push(Credit {
                passenger: passenger.clone(),
                premium: *premium,
                credited,
            });
        }
        Ok(credits)
    }

    /// Apply a plan from `plan_credits` and consume every purchase on `flight`
    pub fn apply_credits(&mut self, flight: &FlightKey, credits: &[Credit]) {
        for credit in credits {
            let balance = self.balances.entry(credit.passenger.clone()).or_default();
            *balance = balance.checked_add(&credit.credited).unwrap_or(*balance);
        }
        self.purchases.remove(flight);
    }

    /// Credit every insuree of `flight` with `premium * multiplier` and
    /// consume their purchases
    pub fn credit_insurees(&mut self, flight: &FlightKey, multiplier: Decimal) -> LedgerResult<Vec<Credit>> {
        let credits = self.plan_credits(flight, multiplier)?;
        self.apply_credits(flight, &credits);
        Ok(credits)
    }

    /// Zero the passenger's balance and hand back what it held
    pub fn take_balance(&mut self, passenger: &Address) -> Amount {
        self.balances.remove(passenger).unwrap_or(Amount::ZERO)
    }
}
