//! Oracle-response simulator
//!
//! Registers a pool of oracles, listens for `OracleRequest` notifications
//! and answers every request with each oracle that holds the requested
//! index. Status values come from a `StatusReporter`.

use async_trait::async_trait;
use flightsure_core::{Address, Amount, FlightKey, StatusCode};
use flightsure_ledger::{EventListener, FlightSuretyLedger, LedgerEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::{broadcast, oneshot, Mutex};

/// Ledger shared between the CLI and simulator tasks
pub type SharedLedger = Arc<Mutex<FlightSuretyLedger>>;

/// Random address in the `0x` + 40 hex form
pub fn random_address(rng: &mut impl Rng) -> Address {
    let bytes: [u8; 20] = rng.gen();
    Address::new(format!("0x{}", hex::encode(bytes)))
}

/// Source of the status an oracle reports
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, oracle: &Address, index: u8, flight: &FlightKey) -> StatusCode;
}

/// Uniformly random status per response
pub struct RandomReporter {
    rng: Mutex<StdRng>,
}

impl RandomReporter {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

#[async_trait]
impl StatusReporter for RandomReporter {
    async fn report(&self, _oracle: &Address, _index: u8, _flight: &FlightKey) -> StatusCode {
        let statuses: Vec<StatusCode> = StatusCode::iter().collect();
        let pick = self.rng.lock().await.gen_range(0..statuses.len());
        statuses[pick]
    }
}

/// Every oracle reports the same status
pub struct FixedReporter(pub StatusCode);

#[async_trait]
impl StatusReporter for FixedReporter {
    async fn report(&self, _oracle: &Address, _index: u8, _flight: &FlightKey) -> StatusCode {
        self.0
    }
}

/// Forwards ledger notifications into a tokio broadcast channel
pub struct BroadcastListener {
    sender: broadcast::Sender<LedgerEvent>,
}

impl BroadcastListener {
    pub fn new(sender: broadcast::Sender<LedgerEvent>) -> Self {
        Self { sender }
    }
}

impl EventListener for BroadcastListener {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn on_event(&mut self, event: &LedgerEvent) {
        // No receivers is fine
        let _ = self.sender.send(event.clone());
    }
}

/// Counters from one simulator run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub requests: usize,
    pub submitted: usize,
    /// Responses refused because the request had already closed
    pub late: usize,
    pub rejected: usize,
}

pub struct OracleSimulator {
    ledger: SharedLedger,
    oracles: Vec<(Address, [u8; 3])>,
    reporter: Arc<dyn StatusReporter>,
}

impl OracleSimulator {
    /// Register `count` fresh oracles, each paying the registration fee
    pub async fn register(
        ledger: SharedLedger,
        count: usize,
        reporter: Arc<dyn StatusReporter>,
        rng: &mut StdRng,
    ) -> anyhow::Result<Self> {
        let mut oracles = Vec::with_capacity(count);
        {
            let mut guard = ledger.lock().await;
            let fee: Amount = guard.registration_fee();
            for _ in 0..count {
                let address = random_address(rng);
                let indexes = guard.register_oracle(fee, &address)?;
                tracing::debug!(oracle = %address, ?indexes, "Simulated oracle registered");
                oracles.push((address, indexes));
            }
        }
        tracing::info!(count, "Oracles registered");

        Ok(Self {
            ledger,
            oracles,
            reporter,
        })
    }

    pub fn oracles(&self) -> &[(Address, [u8; 3])] {
        &self.oracles
    }

    /// Answer requests until `shutdown` fires or the channel closes
    pub async fn run(
        self,
        mut events: broadcast::Receiver<LedgerEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> SimulationStats {
        let mut stats = SimulationStats::default();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                received = events.recv() => match received {
                    Ok(LedgerEvent::OracleRequest { index, flight }) => {
                        stats.requests += 1;
                        self.answer(index, &flight, &mut stats).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Simulator lagged behind ledger events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        tracing::info!(
            requests = stats.requests,
            submitted = stats.submitted,
            late = stats.late,
            rejected = stats.rejected,
            "Simulator stopped"
        );
        stats
    }

    async fn answer(&self, index: u8, flight: &FlightKey, stats: &mut SimulationStats) {
        let responders = self
            .oracles
            .iter()
            .filter(|(_, indexes)| indexes.contains(&index));

        for (oracle, _) in responders {
            let status = self.reporter.report(oracle, index, flight).await;
            let result = self
                .ledger
                .lock()
                .await
                .submit_oracle_response(index, flight, status.code(), oracle);

            match result {
                Ok(_) => stats.submitted += 1,
                Err(e) if e.is_request_closed() => {
                    stats.late += 1;
                    tracing::debug!(oracle = %oracle, flight = %flight, "Late response skipped");
                }
                Err(e) => {
                    stats.rejected += 1;
                    tracing::warn!(oracle = %oracle, flight = %flight, error = %e, "Response rejected");
                }
            }
        }
    }
}
