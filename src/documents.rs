//! Document creation and persistence flow.
//!
//! Creation asks the sequence generator for a code and saves through
//! the store. Between those two steps another writer can take the same
//! code; the UNIQUE constraint reports it and the loop here re-generates
//! from a fresh read instead of trusting the first answer.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config;
use crate::db::repository::DocumentStore;
use crate::db::DatabaseError;
use crate::lifecycle::{self, LifecycleError};
use crate::models::enums::{DocumentKind, DocumentStatus};
use crate::models::SequentialDocument;
use crate::sequence::{SequenceError, SequenceGenerator};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("store error: {0}")]
    Database(#[from] DatabaseError),
}

/// Request to open a consultation or prescription.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub patient_id: Uuid,
    pub kind: DocumentKind,
    pub renewable: bool,
    pub renewals_granted: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Allocate a sequence code and persist the document.
///
/// Each pass re-generates from a fresh read of the store, so a conflict
/// reported by `save` consumes one attempt and the next pass sees the
/// winner's code. Attempts are bounded by the same budget as the
/// generator's own loop.
pub fn create_document<S: DocumentStore>(
    store: &S,
    clock: &dyn Clock,
    req: &NewDocument,
) -> Result<SequentialDocument, DocumentError> {
    let generator = SequenceGenerator::new(store, clock);
    let prefix = req.kind.sequence_prefix();

    for _ in 0..config::SEQUENCE_RETRY_ATTEMPTS {
        let code = generator.generate_next(prefix)?;
        let doc = SequentialDocument {
            id: Uuid::new_v4(),
            patient_id: req.patient_id,
            kind: req.kind,
            sequence_code: code.to_string(),
            sequence_number: code.number,
            sequence_year: code.year,
            status: DocumentStatus::Active,
            renewable: req.renewable,
            renewals_granted: req.renewals_granted,
            renewals_remaining: req.renewals_granted,
            start_date: req.start_date,
            end_date: req.end_date,
            created_at: clock.now(),
        };

        match store.save(&doc) {
            Ok(()) => return Ok(doc),
            Err(e) if e.is_conflict() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(SequenceError::Exhausted {
        prefix: prefix.to_string(),
        attempts: config::SEQUENCE_RETRY_ATTEMPTS,
    }
    .into())
}

/// Consume one renewal and persist the transition.
pub fn renew_document<S: DocumentStore>(
    store: &S,
    doc: SequentialDocument,
) -> Result<SequentialDocument, DocumentError> {
    let renewed = lifecycle::renew(doc)?;
    store.save(&renewed)?;
    Ok(renewed)
}

/// Cancel and persist the transition.
pub fn cancel_document<S: DocumentStore>(
    store: &S,
    doc: SequentialDocument,
) -> Result<SequentialDocument, DocumentError> {
    let cancelled = lifecycle::cancel(doc)?;
    store.save(&cancelled)?;
    Ok(cancelled)
}
