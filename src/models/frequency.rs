use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config;

/// Months between two required monitoring analyses, restricted to 1..=12.
///
/// Annual follow-up is the coarsest cadence a surveillance plan may carry;
/// anything above that is a data-entry error, not a clinical choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FrequencyMonths(u8);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("monitoring frequency must be 1..=12 months, got {months}")]
pub struct InvalidFrequency {
    pub months: u8,
}

impl FrequencyMonths {
    pub fn new(months: u8) -> Result<Self, InvalidFrequency> {
        if (1..=12).contains(&months) {
            Ok(Self(months))
        } else {
            Err(InvalidFrequency { months })
        }
    }

    pub fn months(&self) -> u8 {
        self.0
    }

    /// Advance a date by this many calendar months. Day-of-month is
    /// preserved, clamped to the last valid day of the target month
    /// (Jan 31 + 3 months = Apr 30).
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        from.checked_add_months(Months::new(u32::from(self.0)))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for FrequencyMonths {
    fn default() -> Self {
        Self(config::DEFAULT_FREQUENCY_MONTHS)
    }
}

impl TryFrom<u8> for FrequencyMonths {
    type Error = InvalidFrequency;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<FrequencyMonths> for u8 {
    fn from(f: FrequencyMonths) -> u8 {
        f.0
    }
}
