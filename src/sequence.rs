//! Sequential document identifiers.
//!
//! Codes render as `PREFIX-NNN-YYYY`: a running counter zero-padded to
//! three digits, scoped to a calendar year. The counter restarts at 001
//! when the year changes; fallback codes keep the same shape with epoch
//! milliseconds in the numeric slot.
//!
//! Allocation is a read-then-write against the store, so two concurrent
//! callers can compute the same candidate. The store's UNIQUE constraint
//! decides; this module only re-reads and recomputes within a bounded
//! attempts budget, then falls back to a timestamp-numbered code that
//! keeps the same shape.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use thiserror::Error;

use crate::clock::Clock;
use crate::config;
use crate::db::repository::DocumentStore;
use crate::db::DatabaseError;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z0-9]*)-(\d{3,})-(\d{4})$").unwrap());

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("malformed sequence code: {code}")]
    MalformedCode { code: String },

    #[error("sequence allocation for prefix {prefix} exhausted after {attempts} attempts")]
    Exhausted { prefix: String, attempts: usize },

    #[error("store error: {0}")]
    Database(#[from] DatabaseError),
}

/// Parsed form of a sequence code. `number` is `i64` because fallback
/// codes carry epoch milliseconds in the numeric slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCode {
    pub prefix: String,
    pub number: i64,
    pub year: i32,
}

impl fmt::Display for SequenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}-{}", self.prefix, self.number, self.year)
    }
}

impl FromStr for SequenceCode {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CODE_PATTERN
            .captures(s)
            .ok_or_else(|| SequenceError::MalformedCode { code: s.to_string() })?;

        let number: i64 = caps[2]
            .parse()
            .map_err(|_| SequenceError::MalformedCode { code: s.to_string() })?;
        let year: i32 = caps[3]
            .parse()
            .map_err(|_| SequenceError::MalformedCode { code: s.to_string() })?;

        Ok(SequenceCode {
            prefix: caps[1].to_string(),
            number,
            year,
        })
    }
}

/// Next code in a sequence, pure in its inputs.
///
/// The counter restarts at 001 for `year` when the highest existing code
/// is absent, belongs to another year, or fails to parse (a malformed
/// highest code is recovered here, not surfaced). Otherwise the numeric
/// component increments by one.
pub fn next_in_sequence(prefix: &str, highest: Option<&str>, year: i32) -> SequenceCode {
    match highest.and_then(|code| code.parse::<SequenceCode>().ok()) {
        Some(prev) if prev.year == year && prev.prefix == prefix => SequenceCode {
            prefix: prefix.to_string(),
            number: prev.number + 1,
            year,
        },
        _ => SequenceCode {
            prefix: prefix.to_string(),
            number: 1,
            year,
        },
    }
}

/// Allocates codes against a store, re-reading the highest code before
/// every attempt rather than trusting a cached notion of it.
pub struct SequenceGenerator<'a, S: DocumentStore> {
    store: &'a S,
    clock: &'a dyn Clock,
    attempts: usize,
}

impl<'a, S: DocumentStore> SequenceGenerator<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            attempts: config::SEQUENCE_RETRY_ATTEMPTS,
        }
    }

    pub fn with_attempts(store: &'a S, clock: &'a dyn Clock, attempts: usize) -> Self {
        Self {
            store,
            clock,
            attempts,
        }
    }

    /// Next free code for `prefix`. Candidates already present in the
    /// store are skipped and recomputed from a fresh read; once the
    /// attempts budget is spent, a timestamp-numbered code of the same
    /// shape is tried. Only if that one is also taken does allocation
    /// fail.
    ///
    /// The returned code is not reserved — persisting it can still
    /// conflict, and the caller is expected to come back here.
    pub fn generate_next(&self, prefix: &str) -> Result<SequenceCode, SequenceError> {
        let year = self.clock.today().year();

        for _ in 0..self.attempts {
            let highest = self.store.find_highest_sequence_code(prefix)?;
            let candidate = next_in_sequence(prefix, highest.as_deref(), year);
            if !self.store.exists_by_sequence_code(&candidate.to_string())? {
                return Ok(candidate);
            }
        }

        let fallback = SequenceCode {
            prefix: prefix.to_string(),
            number: self.clock.now_millis(),
            year,
        };
        if self.store.exists_by_sequence_code(&fallback.to_string())? {
            return Err(SequenceError::Exhausted {
                prefix: prefix.to_string(),
                attempts: self.attempts,
            });
        }
        Ok(fallback)
    }
}
