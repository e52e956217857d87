use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DocumentKind, DocumentStatus};

/// A consultation or prescription carrying a human-readable sequence code.
///
/// `sequence_code` renders as `PREFIX-NNN-YYYY`; `sequence_number` and
/// `sequence_year` are the split components, stored separately so the
/// highest code of a year is a numeric lookup. Documents are never
/// deleted — they move to a terminal status instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialDocument {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub kind: DocumentKind,
    pub sequence_code: String,
    pub sequence_number: i64,
    pub sequence_year: i32,
    pub status: DocumentStatus,
    pub renewable: bool,
    pub renewals_granted: u32,
    pub renewals_remaining: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}
