//! CLI commands

use chrono::Utc;
use flightsure_core::{Address, Amount, FlightKey, StatusCode};
use flightsure_events::EventReader;
use flightsure_ledger::{LedgerConfig, LedgerEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::context::AppContext;
use crate::deploy::DeploymentConfig;
use crate::simulator::{
    random_address, FixedReporter, OracleSimulator, RandomReporter, SimulationStats,
    StatusReporter,
};

/// Write the deployment config and check it deploys cleanly
pub fn deploy(
    output: &Path,
    deployment: &DeploymentConfig,
    config: &LedgerConfig,
) -> anyhow::Result<()> {
    deployment.deploy(config.clone())?;
    deployment.write(output)?;

    println!("✅ Ledger deployed at {}", deployment.ledger_address);
    println!("   Owner: {}", deployment.owner);
    println!(
        "   First airline: {} ({})",
        deployment.first_airline, deployment.first_airline_name
    );
    println!("   Config written to {}", output.display());
    Ok(())
}

/// Print the effective ledger configuration
pub fn show_config(config: &LedgerConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Parameters of one simulated flight
#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    pub flight: String,
    pub oracles: usize,
    pub passengers: usize,
    pub premium: Amount,
    /// Status every oracle reports; random per response when `None`
    pub status: Option<StatusCode>,
    pub timeout: Duration,
    pub seed: Option<u64>,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            flight: "ND1309".to_string(),
            oracles: 60,
            passengers: 3,
            premium: Amount::ether(1),
            status: None,
            timeout: Duration::from_secs(5),
            seed: None,
        }
    }
}

/// What happened to a simulated flight
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub flight: FlightKey,
    pub index: u8,
    /// `None` if no status reached quorum before the timeout
    pub status: Option<StatusCode>,
    pub payouts: Vec<(Address, Amount)>,
    pub stats: SimulationStats,
}

/// Insure a flight, let the oracle simulator settle it and withdraw
pub async fn simulate(ctx: &AppContext, options: &ScenarioOptions) -> anyhow::Result<ScenarioReport> {
    let run_id = Uuid::new_v4();
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    tracing::info!(%run_id, oracles = options.oracles, passengers = options.passengers, "Scenario started");

    let reporter: Arc<dyn StatusReporter> = match options.status {
        Some(status) => Arc::new(FixedReporter(status)),
        None => Arc::new(RandomReporter::new(options.seed)),
    };
    let simulator =
        OracleSimulator::register(ctx.ledger.clone(), options.oracles, reporter, &mut rng).await?;

    let (stop, shutdown) = oneshot::channel();
    let task = tokio::spawn(simulator.run(ctx.subscribe(), shutdown));
    let mut watcher = ctx.subscribe();

    let flight = FlightKey::new(
        ctx.deployment.first_airline.clone(),
        options.flight.clone(),
        Utc::now().timestamp().max(0) as u64,
    );
    let passengers: Vec<Address> = (0..options.passengers)
        .map(|_| random_address(&mut rng))
        .collect();

    let index = {
        let mut ledger = ctx.ledger.lock().await;
        for passenger in &passengers {
            ledger.purchase_insurance(&flight, options.premium, passenger)?;
        }
        let requester = passengers.first().unwrap_or(&ctx.deployment.owner);
        ledger.fetch_flight_status(&flight, requester)?
    };

    let status = wait_for_status(&mut watcher, &flight, options.timeout).await;
    if status.is_none() {
        tracing::warn!(flight = %flight, "No quorum before timeout; request stays open");
    }

    // The simulator may already be gone if the channel closed
    let _ = stop.send(());
    let stats = task.await?;

    let mut payouts = Vec::with_capacity(passengers.len());
    {
        let mut ledger = ctx.ledger.lock().await;
        for passenger in &passengers {
            let paid = ledger.pay(passenger, passenger)?;
            payouts.push((passenger.clone(), paid));
        }
    }

    tracing::info!(%run_id, flight = %flight, ?status, "Scenario finished");
    Ok(ScenarioReport {
        run_id,
        flight,
        index,
        status,
        payouts,
        stats,
    })
}

async fn wait_for_status(
    events: &mut broadcast::Receiver<LedgerEvent>,
    flight: &FlightKey,
    timeout: Duration,
) -> Option<StatusCode> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(LedgerEvent::FlightStatusInfo { flight: settled, status }) if &settled == flight => {
                    return Some(status);
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(timeout, wait).await.ok().flatten()
}

/// Print a scenario report
pub fn print_report(report: &ScenarioReport) {
    println!("✈️  Flight {} (run {})", report.flight, report.run_id);
    println!("   Request index: {}", report.index);
    match report.status {
        Some(status) => println!("   Final status: {} ({})", status, status.code()),
        None => println!("   Final status: none (no quorum)"),
    }
    println!(
        "   Oracle responses: {} submitted, {} late, {} rejected",
        report.stats.submitted, report.stats.late, report.stats.rejected
    );
    for (passenger, paid) in &report.payouts {
        println!("   {} paid {}", passenger, paid);
    }
}

/// Verify the journal numbering and summarize it per event type
pub fn audit(journal_path: &Path) -> anyhow::Result<()> {
    let reader = EventReader::from_directory(journal_path)?;
    let last = reader.verify_sequence()?;
    println!("✅ Journal verified ({} records in {} files)", last, reader.files().len());

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in reader.read_all()? {
        *counts.entry(record.event.name()).or_default() += 1;
    }
    for (name, count) in counts {
        println!("   {:<24} {}", name, count);
    }
    Ok(())
}
