//! Document lifecycle state machine.
//!
//! `active` is the initial state. `terminated` and `cancelled` are
//! terminal; `renewal_pending` is the only transient detour and returns
//! to `active` (renewal granted, supply remaining) or `terminated`
//! (last renewal consumed). Transitions are pure — persisting the
//! returned document is the caller's business.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::enums::DocumentStatus;
use crate::models::SequentialDocument;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("document {code} is {state} and accepts no further transition", state = .status.as_str())]
    AlreadyClosed {
        code: String,
        status: DocumentStatus,
    },

    #[error("document {code} is not renewable")]
    NotRenewable { code: String },

    #[error("document {code} has no renewals remaining")]
    RenewalsExhausted { code: String },

    #[error("document {code} already has a renewal pending")]
    RenewalAlreadyPending { code: String },
}

/// A document with an end date is expired strictly after that date;
/// open-ended documents never expire.
pub fn is_expired(doc: &SequentialDocument, today: NaiveDate) -> bool {
    doc.end_date.is_some_and(|end| today > end)
}

pub fn can_be_renewed(doc: &SequentialDocument) -> bool {
    !doc.status.is_terminal() && doc.renewable && doc.renewals_remaining > 0
}

fn ensure_renewable(doc: &SequentialDocument) -> Result<(), LifecycleError> {
    if doc.status.is_terminal() {
        return Err(LifecycleError::AlreadyClosed {
            code: doc.sequence_code.clone(),
            status: doc.status,
        });
    }
    if !doc.renewable {
        return Err(LifecycleError::NotRenewable {
            code: doc.sequence_code.clone(),
        });
    }
    if doc.renewals_remaining == 0 {
        return Err(LifecycleError::RenewalsExhausted {
            code: doc.sequence_code.clone(),
        });
    }
    Ok(())
}

/// Park an active document while a renewal request is examined.
pub fn request_renewal(mut doc: SequentialDocument) -> Result<SequentialDocument, LifecycleError> {
    ensure_renewable(&doc)?;
    if doc.status == DocumentStatus::RenewalPending {
        return Err(LifecycleError::RenewalAlreadyPending {
            code: doc.sequence_code.clone(),
        });
    }
    doc.status = DocumentStatus::RenewalPending;
    Ok(doc)
}

/// Consume one renewal. The document stays usable (`active`) until the
/// last renewal is consumed, at which point it terminates.
pub fn renew(mut doc: SequentialDocument) -> Result<SequentialDocument, LifecycleError> {
    ensure_renewable(&doc)?;
    doc.renewals_remaining -= 1;
    doc.status = if doc.renewals_remaining == 0 {
        DocumentStatus::Terminated
    } else {
        DocumentStatus::Active
    };
    Ok(doc)
}

/// Cancel from any non-terminal state. Final — there is no path out of
/// `cancelled`.
pub fn cancel(mut doc: SequentialDocument) -> Result<SequentialDocument, LifecycleError> {
    if doc.status.is_terminal() {
        return Err(LifecycleError::AlreadyClosed {
            code: doc.sequence_code.clone(),
            status: doc.status,
        });
    }
    doc.status = DocumentStatus::Cancelled;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::DocumentKind;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_doc(renewable: bool, renewals: u32) -> SequentialDocument {
        SequentialDocument {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            kind: DocumentKind::Prescription,
            sequence_code: "ORD-001-2025".into(),
            sequence_number: 1,
            sequence_year: 2025,
            status: DocumentStatus::Active,
            renewable,
            renewals_granted: renewals,
            renewals_remaining: renewals,
            start_date: date(2025, 1, 10),
            end_date: None,
            created_at: date(2025, 1, 10).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    // ── Expiry ───────────────────────────────────────────

    #[test]
    fn open_ended_document_never_expires() {
        let doc = make_doc(false, 0);
        assert!(!is_expired(&doc, date(2099, 1, 1)));
    }

    #[test]
    fn expiry_is_strictly_after_end_date() {
        let mut doc = make_doc(false, 0);
        doc.end_date = Some(date(2025, 3, 31));
        assert!(!is_expired(&doc, date(2025, 3, 30)));
        assert!(!is_expired(&doc, date(2025, 3, 31)));
        assert!(is_expired(&doc, date(2025, 4, 1)));
    }

    // ── Renewal ──────────────────────────────────────────

    #[test]
    fn renew_decrements_and_keeps_active() {
        let doc = make_doc(true, 3);
        let renewed = renew(doc).unwrap();
        assert_eq!(renewed.renewals_remaining, 2);
        assert_eq!(renewed.status, DocumentStatus::Active);
    }

    #[test]
    fn last_renewal_terminates() {
        let doc = make_doc(true, 1);
        let renewed = renew(doc).unwrap();
        assert_eq!(renewed.renewals_remaining, 0);
        assert_eq!(renewed.status, DocumentStatus::Terminated);
    }

    #[test]
    fn renew_from_pending_returns_to_active() {
        let doc = make_doc(true, 2);
        let pending = request_renewal(doc).unwrap();
        assert_eq!(pending.status, DocumentStatus::RenewalPending);

        let renewed = renew(pending).unwrap();
        assert_eq!(renewed.status, DocumentStatus::Active);
        assert_eq!(renewed.renewals_remaining, 1);
    }

    #[test]
    fn non_renewable_document_rejected() {
        let doc = make_doc(false, 0);
        assert!(!can_be_renewed(&doc));
        let err = renew(doc).unwrap_err();
        assert!(matches!(err, LifecycleError::NotRenewable { .. }));
    }

    #[test]
    fn exhausted_renewals_rejected() {
        let mut doc = make_doc(true, 2);
        doc.renewals_remaining = 0;
        assert!(!can_be_renewed(&doc));
        let err = renew(doc).unwrap_err();
        assert!(matches!(err, LifecycleError::RenewalsExhausted { .. }));
    }

    #[test]
    fn terminated_document_cannot_renew() {
        let mut doc = make_doc(true, 3);
        doc.status = DocumentStatus::Terminated;
        assert!(!can_be_renewed(&doc));
        let err = renew(doc).unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyClosed { .. }));
    }

    #[test]
    fn double_renewal_request_rejected() {
        let doc = make_doc(true, 2);
        let pending = request_renewal(doc).unwrap();
        let err = request_renewal(pending).unwrap_err();
        assert!(matches!(err, LifecycleError::RenewalAlreadyPending { .. }));
    }

    // ── Cancellation ─────────────────────────────────────

    #[test]
    fn cancel_from_active() {
        let doc = make_doc(true, 3);
        let cancelled = cancel(doc).unwrap();
        assert_eq!(cancelled.status, DocumentStatus::Cancelled);
    }

    #[test]
    fn cancel_from_renewal_pending() {
        let doc = make_doc(true, 2);
        let pending = request_renewal(doc).unwrap();
        let cancelled = cancel(pending).unwrap();
        assert_eq!(cancelled.status, DocumentStatus::Cancelled);
    }

    #[test]
    fn cancelled_document_stays_cancelled() {
        let doc = make_doc(true, 3);
        let cancelled = cancel(doc).unwrap();
        let err = cancel(cancelled.clone()).unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyClosed { .. }));

        let err = renew(cancelled).unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyClosed { .. }));
    }
}
