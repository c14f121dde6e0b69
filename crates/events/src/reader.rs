//! JSONL journal reader - sequential reader for replay and audit

use crate::error::EventError;
use crate::record::JournalRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Sequential journal reader
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        Ok(Self {
            files: list_journal_files(path.as_ref())?,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read all records from all files in order
    pub fn read_all(&self) -> Result<Vec<JournalRecord>, EventError> {
        let mut records = Vec::new();
        for file_path in &self.files {
            read_file(file_path, &mut records)?;
        }
        Ok(records)
    }

    /// Sequence number of the newest record
    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        // Files are date-named, so the newest record is in the last file
        let Some(last_file) = self.files.last() else {
            return Ok(None);
        };

        let mut records = Vec::new();
        read_file(last_file, &mut records)?;
        Ok(records.last().map(|record| record.sequence))
    }

    /// Count total records across all files
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;

        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    /// Check that sequence numbers run 1, 2, 3, ... without gaps
    pub fn verify_sequence(&self) -> Result<u64, EventError> {
        let mut expected = 1;
        for record in self.read_all()? {
            if record.sequence != expected {
                return Err(EventError::SequenceGap {
                    expected,
                    found: record.sequence,
                });
            }
            expected += 1;
        }
        Ok(expected - 1)
    }
}

/// `.jsonl` files under `path`, sorted by name
pub(crate) fn list_journal_files(path: &Path) -> Result<Vec<PathBuf>, EventError> {
    let mut files = Vec::new();

    if path.exists() {
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(file_path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn read_file(file_path: &Path, records: &mut Vec<JournalRecord>) -> Result<(), EventError> {
    let reader = BufReader::new(File::open(file_path)?);

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: JournalRecord =
            serde_json::from_str(&line).map_err(|e| EventError::InvalidFile {
                file: file_path.display().to_string(),
                line: number + 1,
                reason: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(())
}
