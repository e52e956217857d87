//! Repository layer — every query the core consumes, plus the store
//! traits that let the pure components run against an in-memory fake.
//!
//! List-valued fields (`parameters`, `last_results`) live as typed
//! fields on the models; JSON encoding happens here, at the persistence
//! boundary, and nowhere else.

pub mod document;
pub mod monitoring;
pub mod patient;

pub use document::*;
pub use monitoring::*;
pub use patient::*;

use rusqlite::Connection;

use super::DatabaseError;
use crate::models::{MonitoringRecord, SequentialDocument};

/// Store collaborator for sequential documents. The UNIQUE constraint
/// behind `save` is the source of truth for code uniqueness; the
/// generator's retry loop compensates for the read-then-write gap.
pub trait DocumentStore {
    /// Highest existing code for a prefix (latest year first, then the
    /// largest numeric component), if any document carries that prefix.
    fn find_highest_sequence_code(&self, prefix: &str) -> Result<Option<String>, DatabaseError>;

    /// Cheap pre-check used between allocation attempts.
    fn exists_by_sequence_code(&self, code: &str) -> Result<bool, DatabaseError>;

    /// Insert or update; `DatabaseError::Conflict` when another document
    /// already holds the sequence code.
    fn save(&self, doc: &SequentialDocument) -> Result<(), DatabaseError>;
}

/// Store collaborator for monitoring records.
pub trait MonitoringStore {
    fn save(&self, record: &MonitoringRecord) -> Result<(), DatabaseError>;
}

/// rusqlite-backed `DocumentStore`.
pub struct SqliteDocumentStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteDocumentStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn find_highest_sequence_code(&self, prefix: &str) -> Result<Option<String>, DatabaseError> {
        document::find_highest_sequence_code(self.conn, prefix)
    }

    fn exists_by_sequence_code(&self, code: &str) -> Result<bool, DatabaseError> {
        document::exists_by_sequence_code(self.conn, code)
    }

    fn save(&self, doc: &SequentialDocument) -> Result<(), DatabaseError> {
        document::save_document(self.conn, doc)
    }
}

/// rusqlite-backed `MonitoringStore`.
pub struct SqliteMonitoringStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteMonitoringStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl MonitoringStore for SqliteMonitoringStore<'_> {
    fn save(&self, record: &MonitoringRecord) -> Result<(), DatabaseError> {
        monitoring::save_monitoring_record(self.conn, record)
    }
}
