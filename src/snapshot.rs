//! Patient summary staleness detection.
//!
//! A patient's printed/cached summary only needs regenerating when the
//! clinical fields feeding it moved. This module condenses those fields
//! into a short comparison token: stable encoding, SHA-256, truncated.
//! The token is a fingerprint for equality checks, recomputed on every
//! comparison — never stored as the data itself, and not a security
//! digest.

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Clinical fields a patient summary is derived from. Field order is
/// part of the token — append new fields, do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInputs {
    pub patient_id: Uuid,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    /// Active prescription codes, in sequence order.
    pub active_treatments: Vec<String>,
    pub latest_document_at: Option<NaiveDateTime>,
    pub document_count: u64,
}

/// Comparison token over the inputs: 16 digest bytes, URL-safe base64.
pub fn compute_token(inputs: &SnapshotInputs) -> String {
    // Struct serialization is infallible here: no non-string map keys.
    let encoded = serde_json::to_vec(inputs).expect("snapshot inputs serialize");
    let digest = Sha256::digest(&encoded);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&digest[..16])
}

/// Whether the cached artifact behind `previous_token` is stale. No
/// previous token means nothing was cached yet — counts as changed.
pub fn has_changed(previous_token: Option<&str>, inputs: &SnapshotInputs) -> bool {
    match previous_token {
        Some(token) => compute_token(inputs) != token,
        None => true,
    }
}
