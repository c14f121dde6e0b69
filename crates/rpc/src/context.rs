//! Application context - wires everything together

use flightsure_events::{EventStore, JournalListener};
use flightsure_ledger::{LedgerConfig, LedgerEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::deploy::DeploymentConfig;
use crate::simulator::{BroadcastListener, SharedLedger};

/// Buffered notifications per subscriber before it starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Application context - a deployed ledger plus its journal and event feed
pub struct AppContext {
    pub ledger: SharedLedger,
    pub deployment: DeploymentConfig,
    events: broadcast::Sender<LedgerEvent>,
    journal_path: PathBuf,
}

impl AppContext {
    /// Deploy a ledger and attach the journal and broadcast listeners
    pub fn new(
        data_path: impl AsRef<Path>,
        config: LedgerConfig,
        deployment: DeploymentConfig,
    ) -> anyhow::Result<Self> {
        let journal_path = data_path.as_ref().join("journal");
        std::fs::create_dir_all(&journal_path)?;

        let mut ledger = deployment.deploy(config)?;

        let store = EventStore::new(&journal_path)?;
        ledger.add_listener(Box::new(JournalListener::new(store)));

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        ledger.add_listener(Box::new(BroadcastListener::new(events.clone())));

        Ok(Self {
            ledger: Arc::new(Mutex::new(ledger)),
            deployment,
            events,
            journal_path,
        })
    }

    /// Receive every notification emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Get journal path
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}
