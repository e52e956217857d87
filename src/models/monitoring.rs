use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MonitoringPriority, MonitoringStatus, MonitoringType};
use super::frequency::FrequencyMonths;

/// Recurring biological surveillance plan for one patient, optionally
/// tied to the medication (DCI) that motivates it.
///
/// Invariants maintained by the scheduler:
/// - `next_due_date >= start_date`
/// - `next_due_date = last_analysis_date + frequency` once an analysis
///   has been recorded, `start_date` before that
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Generic drug name (DCI) motivating the surveillance, if any.
    pub medication_ref: Option<String>,
    pub monitoring_type: MonitoringType,
    /// Lab parameters to check (ASAT, ALAT, creatinine, DFG...).
    pub parameters: Vec<String>,
    pub frequency: FrequencyMonths,
    pub start_date: NaiveDate,
    pub last_analysis_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    /// Last analysis values keyed by parameter name.
    pub last_results: Option<serde_json::Map<String, serde_json::Value>>,
    pub status: MonitoringStatus,
    pub priority: MonitoringPriority,
    pub created_at: NaiveDateTime,
}
