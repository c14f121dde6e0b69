//! FlightSure Events - JSONL notification journal
//!
//! Ledger notifications are appended to date-named JSONL files, numbered
//! contiguously, and can be read back in order for audit.

pub mod error;
pub mod listener;
pub mod reader;
pub mod record;
pub mod store;

pub use error::EventError;
pub use listener::JournalListener;
pub use reader::EventReader;
pub use record::JournalRecord;
pub use store::EventStore;
