//! JSONL journal - append-only writer, one file per UTC day

use crate::error::EventError;
use crate::reader::{list_journal_files, EventReader};
use crate::record::JournalRecord;
use chrono::Utc;
use flightsure_ledger::LedgerEvent;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL journal of ledger notifications
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    last_sequence: u64,
}

impl EventStore {
    /// Open (or create) a journal at the given path; numbering continues
    /// from the records already there
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let last_sequence = EventReader::from_directory(&base_path)?
            .last_sequence()?
            .unwrap_or(0);

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            last_sequence,
        })
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Append an event; returns the record as written
    pub fn append(&mut self, event: &LedgerEvent) -> Result<JournalRecord, EventError> {
        let record = JournalRecord::new(self.last_sequence + 1, event.clone());
        let date = record.recorded_at.format("%Y-%m-%d").to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(&record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        self.last_sequence = record.sequence;
        Ok(record)
    }

    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        tracing::debug!(file = %file_path.display(), "Journal file opened");
        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// Get the path to today's file
    pub fn today_file_path(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        self.base_path.join(format!("{}.jsonl", date))
    }

    /// List all JSONL files in the journal
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        list_journal_files(&self.base_path)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
