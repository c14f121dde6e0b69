//! FlightSure CLI - Main entry point

use clap::{Parser, Subcommand};
use flightsure_core::{Address, Amount, StatusCode};
use flightsure_ledger::{IndexSourceKind, LedgerConfig};
use flightsure_rpc::commands::{self, ScenarioOptions};
use flightsure_rpc::deploy::{
    DEFAULT_FIRST_AIRLINE, DEFAULT_FIRST_AIRLINE_NAME, DEFAULT_OWNER, DEFAULT_URL,
};
use flightsure_rpc::{AppContext, DeploymentConfig};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flightsure")]
#[command(about = "FlightSure - Flight-delay insurance ledger", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Ledger configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for oracle indices and simulated identities
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a ledger and write its deployment config
    Deploy {
        /// Node URL published to collaborators
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
        /// Owner identity
        #[arg(long, default_value = DEFAULT_OWNER)]
        owner: String,
        /// First airline identity
        #[arg(long, default_value = DEFAULT_FIRST_AIRLINE)]
        first_airline: String,
        /// First airline name
        #[arg(long, default_value = DEFAULT_FIRST_AIRLINE_NAME)]
        name: String,
        /// Output file (defaults to <data>/deployment.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Insure a flight and let simulated oracles settle it
    Simulate {
        /// Flight number
        #[arg(long, default_value = "ND1309")]
        flight: String,
        /// Number of oracles to register
        #[arg(long, default_value = "60")]
        oracles: usize,
        /// Number of insured passengers
        #[arg(long, default_value = "3")]
        passengers: usize,
        /// Premium per passenger (ether)
        #[arg(long, default_value = "1")]
        premium: Decimal,
        /// Status code every oracle reports (random when omitted)
        #[arg(long)]
        status: Option<u8>,
        /// Milliseconds to wait for quorum
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Verify the notification journal
    Audit,

    /// Print the effective ledger configuration
    Config,
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(seed) = seed {
        config.index_source = IndexSourceKind::Entropy;
        config.index_seed = Some(seed);
    }
    Ok(config)
}

fn load_deployment(data: &Path) -> anyhow::Result<DeploymentConfig> {
    let path = data.join("deployment.json");
    if path.exists() {
        DeploymentConfig::load(&path)
    } else {
        tracing::info!("No deployment.json found, using the default deployment");
        Ok(DeploymentConfig::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Deploy {
            url,
            owner,
            first_airline,
            name,
            output,
        } => {
            let deployment = DeploymentConfig::new(
                url,
                Address::new(owner),
                Address::new(first_airline),
                name,
            );
            let output = output.unwrap_or_else(|| cli.data.join("deployment.json"));
            commands::deploy(&output, &deployment, &config)?;
        }

        Commands::Simulate {
            flight,
            oracles,
            passengers,
            premium,
            status,
            timeout_ms,
        } => {
            let options = ScenarioOptions {
                flight,
                oracles,
                passengers,
                premium: Amount::new(premium)?,
                status: status.map(StatusCode::try_from).transpose()?,
                timeout: Duration::from_millis(timeout_ms),
                seed: cli.seed,
            };

            let deployment = load_deployment(&cli.data)?;
            let ctx = AppContext::new(&cli.data, config, deployment)?;
            let report = commands::simulate(&ctx, &options).await?;
            commands::print_report(&report);
        }

        Commands::Audit => {
            commands::audit(&cli.data.join("journal"))?;
        }

        Commands::Config => {
            commands::show_config(&config)?;
        }
    }

    Ok(())
}
