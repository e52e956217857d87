//! Recurring biological monitoring scheduler.
//!
//! Computes when the next analysis of a surveillance plan is due,
//! classifies how urgent a due date is, records incoming lab results,
//! and produces the ordered due-list. Everything here is pure date
//! arithmetic over the records it is handed; the only side effect is
//! the explicit `store.save` in the two service functions.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::repository::MonitoringStore;
use crate::db::DatabaseError;
use crate::models::enums::{MonitoringPriority, MonitoringStatus, MonitoringType};
use crate::models::frequency::InvalidFrequency;
use crate::models::{FrequencyMonths, MonitoringRecord};

/// Upper bound of the "urgent" window, in days from today.
const URGENT_WINDOW_DAYS: i64 = 7;
/// Upper bound of the "upcoming" window, in days from today.
const UPCOMING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error(transparent)]
    InvalidFrequency(#[from] InvalidFrequency),

    #[error("analysis date {analysis_date} precedes monitoring start {start_date}")]
    AnalysisBeforeStart {
        analysis_date: NaiveDate,
        start_date: NaiveDate,
    },

    #[error("store error: {0}")]
    Database(#[from] DatabaseError),
}

/// How pressing a due date is, most pressing first.
///
/// Half-open windows, no date classifies twice: day 7 is still urgent,
/// day 8 is upcoming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Overdue,
    Urgent,
    Upcoming,
    Normal,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Overdue => "overdue",
            Urgency::Urgent => "urgent",
            Urgency::Upcoming => "upcoming",
            Urgency::Normal => "normal",
        }
    }
}

/// Stored priority tracking a classification at write time.
pub fn priority_for(urgency: Urgency) -> MonitoringPriority {
    match urgency {
        Urgency::Overdue => MonitoringPriority::Urgent,
        Urgency::Urgent => MonitoringPriority::High,
        Urgency::Upcoming => MonitoringPriority::Normal,
        Urgency::Normal => MonitoringPriority::Low,
    }
}

/// Due date of the next analysis: the plan's start until a first result
/// exists, then one cadence past the last analysis. Day-of-month is
/// preserved, clamped to the end of shorter months.
pub fn compute_next_due_date(
    last_analysis_date: Option<NaiveDate>,
    start_date: NaiveDate,
    frequency: FrequencyMonths,
) -> NaiveDate {
    match last_analysis_date {
        Some(last) => frequency.advance(last),
        None => start_date,
    }
}

pub fn classify_urgency(next_due_date: NaiveDate, today: NaiveDate) -> Urgency {
    let days_until = (next_due_date - today).num_days();
    if days_until < 0 {
        Urgency::Overdue
    } else if days_until <= URGENT_WINDOW_DAYS {
        Urgency::Urgent
    } else if days_until <= UPCOMING_WINDOW_DAYS {
        Urgency::Upcoming
    } else {
        Urgency::Normal
    }
}

/// Fold an analysis result into a record: stamps the analysis date and
/// values, advances `next_due_date` by one cadence, and wakes a
/// `pending` plan to `active`. Rejects analyses dated before the plan
/// started.
pub fn record_result(
    record: &MonitoringRecord,
    results: Map<String, Value>,
    analysis_date: NaiveDate,
) -> Result<MonitoringRecord, MonitoringError> {
    if analysis_date < record.start_date {
        return Err(MonitoringError::AnalysisBeforeStart {
            analysis_date,
            start_date: record.start_date,
        });
    }

    let mut updated = record.clone();
    updated.last_analysis_date = Some(analysis_date);
    updated.last_results = Some(results);
    updated.next_due_date =
        compute_next_due_date(Some(analysis_date), record.start_date, record.frequency);
    if updated.status == MonitoringStatus::Pending {
        updated.status = MonitoringStatus::Active;
    }
    Ok(updated)
}

/// Records needing attention: overdue, or due within `horizon_days`.
/// Ordered overdue-first, then by ascending due date. Completed and
/// cancelled plans are never due. Stateless — same inputs, same list.
pub fn list_due<'a>(
    records: &'a [MonitoringRecord],
    today: NaiveDate,
    horizon_days: i64,
) -> Vec<&'a MonitoringRecord> {
    let mut due: Vec<&MonitoringRecord> = records
        .iter()
        .filter(|r| {
            matches!(
                r.status,
                MonitoringStatus::Active | MonitoringStatus::Pending
            )
        })
        // negative days_until is overdue, small non-negative is due soon
        .filter(|r| (r.next_due_date - today).num_days() <= horizon_days)
        .collect();

    due.sort_by_key(|r| (classify_urgency(r.next_due_date, today), r.next_due_date));
    due
}

/// Request to open a surveillance plan.
#[derive(Debug, Clone)]
pub struct NewMonitoring {
    pub patient_id: Uuid,
    pub medication_ref: Option<String>,
    pub monitoring_type: MonitoringType,
    pub parameters: Vec<String>,
    /// Cadence between analyses; the standard 3-month cadence if the
    /// prescriber left it unspecified.
    pub frequency: Option<FrequencyMonths>,
    pub start_date: NaiveDate,
}

/// Open a plan and persist it. Plans starting in the future sit
/// `pending` until their first result; plans already started are
/// `active` immediately.
pub fn create_monitoring<S: MonitoringStore>(
    store: &S,
    clock: &dyn Clock,
    req: NewMonitoring,
) -> Result<MonitoringRecord, MonitoringError> {
    let frequency = req.frequency.unwrap_or_default();
    let next_due_date = compute_next_due_date(None, req.start_date, frequency);
    let today = clock.today();

    let record = MonitoringRecord {
        id: Uuid::new_v4(),
        patient_id: req.patient_id,
        medication_ref: req.medication_ref,
        monitoring_type: req.monitoring_type,
        parameters: req.parameters,
        frequency,
        start_date: req.start_date,
        last_analysis_date: None,
        next_due_date,
        last_results: None,
        status: if req.start_date > today {
            MonitoringStatus::Pending
        } else {
            MonitoringStatus::Active
        },
        priority: priority_for(classify_urgency(next_due_date, today)),
        created_at: clock.now(),
    };

    store.save(&record)?;
    Ok(record)
}

/// Fold in a result and persist, refreshing the stored priority against
/// the new due date.
pub fn record_analysis<S: MonitoringStore>(
    store: &S,
    clock: &dyn Clock,
    record: &MonitoringRecord,
    results: Map<String, Value>,
    analysis_date: NaiveDate,
) -> Result<MonitoringRecord, MonitoringError> {
    let mut updated = record_result(record, results, analysis_date)?;
    updated.priority = priority_for(classify_urgency(updated.next_due_date, clock.today()));
    store.save(&updated)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config;
    use crate::db::repository::SqliteMonitoringStore;
    use crate::db::repository::{get_monitoring_record, insert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::Patient;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn freq(months: u8) -> FrequencyMonths {
        FrequencyMonths::new(months).unwrap()
    }

    fn make_record(start: NaiveDate, due: NaiveDate, status: MonitoringStatus) -> MonitoringRecord {
        MonitoringRecord {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            medication_ref: None,
            monitoring_type: MonitoringType::Renal,
            parameters: vec!["creatinine".into(), "DFG".into()],
            frequency: freq(3),
            start_date: start,
            last_analysis_date: None,
            next_due_date: due,
            last_results: None,
            status,
            priority: MonitoringPriority::Normal,
            created_at: start.and_hms_opt(10, 0, 0).unwrap(),
        }
    }

    // ── Next due date ────────────────────────────────────

    #[test]
    fn without_analysis_due_date_is_start() {
        let start = date(2024, 1, 31);
        assert_eq!(compute_next_due_date(None, start, freq(3)), start);
    }

    #[test]
    fn after_analysis_due_date_advances_with_clamping() {
        let start = date(2024, 1, 31);
        let due = compute_next_due_date(Some(date(2024, 1, 31)), start, freq(3));
        assert_eq!(due, date(2024, 4, 30));
    }

    #[test]
    fn due_date_preserves_day_when_valid() {
        let due = compute_next_due_date(Some(date(2024, 2, 10)), date(2024, 1, 1), freq(6));
        assert_eq!(due, date(2024, 8, 10));
    }

    // ── Urgency windows ──────────────────────────────────

    #[test]
    fn urgency_boundaries() {
        let today = date(2025, 6, 1);
        let at = |days: i64| classify_urgency(today + chrono::Duration::days(days), today);

        assert_eq!(at(-1), Urgency::Overdue);
        assert_eq!(at(0), Urgency::Urgent);
        assert_eq!(at(7), Urgency::Urgent);
        assert_eq!(at(8), Urgency::Upcoming);
        assert_eq!(at(30), Urgency::Upcoming);
        assert_eq!(at(31), Urgency::Normal);
    }

    #[test]
    fn urgency_orders_most_pressing_first() {
        assert!(Urgency::Overdue < Urgency::Urgent);
        assert!(Urgency::Urgent < Urgency::Upcoming);
        assert!(Urgency::Upcoming < Urgency::Normal);
    }

    #[test]
    fn priority_escalates_with_urgency() {
        assert_eq!(priority_for(Urgency::Overdue), MonitoringPriority::Urgent);
        assert_eq!(priority_for(Urgency::Urgent), MonitoringPriority::High);
        assert_eq!(priority_for(Urgency::Upcoming), MonitoringPriority::Normal);
        assert_eq!(priority_for(Urgency::Normal), MonitoringPriority::Low);
    }

    // ── Recording results ────────────────────────────────

    fn some_results() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("creatinine".into(), serde_json::json!(78));
        map
    }

    #[test]
    fn record_result_updates_due_date_and_results() {
        let record = make_record(date(2024, 1, 31), date(2024, 1, 31), MonitoringStatus::Active);
        let updated = record_result(&record, some_results(), date(2024, 1, 31)).unwrap();

        assert_eq!(updated.last_analysis_date, Some(date(2024, 1, 31)));
        assert_eq!(updated.next_due_date, date(2024, 4, 30));
        assert_eq!(updated.last_results.unwrap()["creatinine"], 78);
    }

    #[test]
    fn record_result_wakes_pending_plan() {
        let record = make_record(date(2025, 1, 1), date(2025, 1, 1), MonitoringStatus::Pending);
        let updated = record_result(&record, some_results(), date(2025, 1, 15)).unwrap();
        assert_eq!(updated.status, MonitoringStatus::Active);
    }

    #[test]
    fn record_result_rejects_analysis_before_start() {
        let record = make_record(date(2025, 2, 1), date(2025, 2, 1), MonitoringStatus::Active);
        let err = record_result(&record, some_results(), date(2025, 1, 20)).unwrap_err();
        assert!(matches!(err, MonitoringError::AnalysisBeforeStart { .. }));
    }

    #[test]
    fn record_result_keeps_due_date_at_or_after_start() {
        let record = make_record(date(2025, 2, 1), date(2025, 2, 1), MonitoringStatus::Active);
        let updated = record_result(&record, some_results(), date(2025, 2, 1)).unwrap();
        assert!(updated.next_due_date >= updated.start_date);
    }

    // ── Due list ─────────────────────────────────────────

    #[test]
    fn due_list_orders_overdue_before_urgent() {
        let today = date(2025, 6, 1);
        let records = vec![
            make_record(date(2025, 1, 1), date(2025, 6, 3), MonitoringStatus::Active),
            make_record(date(2025, 1, 1), date(2025, 5, 20), MonitoringStatus::Active),
            make_record(date(2025, 1, 1), date(2025, 6, 2), MonitoringStatus::Active),
            make_record(date(2025, 1, 1), date(2025, 5, 28), MonitoringStatus::Active),
        ];

        let due = list_due(&records, today, config::DUE_HORIZON_DAYS);
        let dates: Vec<NaiveDate> = due.iter().map(|r| r.next_due_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 5, 20),
                date(2025, 5, 28),
                date(2025, 6, 2),
                date(2025, 6, 3),
            ]
        );
    }

    #[test]
    fn due_list_respects_horizon() {
        let today = date(2025, 6, 1);
        let records = vec![
            make_record(date(2025, 1, 1), date(2025, 6, 8), MonitoringStatus::Active),
            make_record(date(2025, 1, 1), date(2025, 6, 9), MonitoringStatus::Active),
        ];

        let within_week = list_due(&records, today, 7);
        assert_eq!(within_week.len(), 1);
        assert_eq!(within_week[0].next_due_date, date(2025, 6, 8));

        let wider = list_due(&records, today, 14);
        assert_eq!(wider.len(), 2);
    }

    #[test]
    fn due_list_skips_closed_plans() {
        let today = date(2025, 6, 1);
        let overdue = date(2025, 5, 1);
        let records = vec![
            make_record(date(2025, 1, 1), overdue, MonitoringStatus::Completed),
            make_record(date(2025, 1, 1), overdue, MonitoringStatus::Cancelled),
            make_record(date(2025, 1, 1), overdue, MonitoringStatus::Pending),
            make_record(date(2025, 1, 1), overdue, MonitoringStatus::Active),
        ];

        let due = list_due(&records, today, config::DUE_HORIZON_DAYS);
        assert_eq!(due.len(), 2);
    }

    #[test]
    fn due_list_is_deterministic() {
        let today = date(2025, 6, 1);
        let records = vec![
            make_record(date(2025, 1, 1), date(2025, 5, 20), MonitoringStatus::Active),
            make_record(date(2025, 1, 1), date(2025, 6, 2), MonitoringStatus::Active),
        ];

        let first: Vec<Uuid> = list_due(&records, today, 7).iter().map(|r| r.id).collect();
        let second: Vec<Uuid> = list_due(&records, today, 7).iter().map(|r| r.id).collect();
        assert_eq!(first, second);
    }

    // ── Services against the SQLite store ────────────────

    fn seed_patient(conn: &rusqlite::Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: "Nadia".into(),
            last_name: "Comte".into(),
            birth_date: None,
            created_at: date(2025, 1, 2).and_hms_opt(9, 0, 0).unwrap(),
        };
        insert_patient(conn, &patient).unwrap();
        patient.id
    }

    #[test]
    fn create_monitoring_persists_computed_fields() {
        let conn = open_memory_database().unwrap();
        let store = SqliteMonitoringStore::new(&conn);
        let clock = FixedClock::on_date(date(2025, 6, 1));
        let patient_id = seed_patient(&conn);

        let record = create_monitoring(
            &store,
            &clock,
            NewMonitoring {
                patient_id,
                medication_ref: Some("amiodarone".into()),
                monitoring_type: MonitoringType::Hepatic,
                parameters: vec!["ASAT".into(), "ALAT".into()],
                frequency: None,
                start_date: date(2025, 5, 15),
            },
        )
        .unwrap();

        assert_eq!(record.frequency.months(), config::DEFAULT_FREQUENCY_MONTHS);
        assert_eq!(record.next_due_date, date(2025, 5, 15));
        assert_eq!(record.status, MonitoringStatus::Active);
        assert_eq!(record.priority, MonitoringPriority::Urgent); // already overdue

        let loaded = get_monitoring_record(&conn, &record.id).unwrap();
        assert_eq!(loaded.next_due_date, record.next_due_date);
    }

    #[test]
    fn create_future_plan_is_pending() {
        let conn = open_memory_database().unwrap();
        let store = SqliteMonitoringStore::new(&conn);
        let clock = FixedClock::on_date(date(2025, 6, 1));
        let patient_id = seed_patient(&conn);

        let record = create_monitoring(
            &store,
            &clock,
            NewMonitoring {
                patient_id,
                medication_ref: None,
                monitoring_type: MonitoringType::Renal,
                parameters: vec!["creatinine".into()],
                frequency: FrequencyMonths::new(6).ok(),
                start_date: date(2025, 9, 1),
            },
        )
        .unwrap();

        assert_eq!(record.status, MonitoringStatus::Pending);
    }

    #[test]
    fn record_analysis_persists_and_refreshes_priority() {
        let conn = open_memory_database().unwrap();
        let store = SqliteMonitoringStore::new(&conn);
        let clock = FixedClock::on_date(date(2025, 6, 1));
        let patient_id = seed_patient(&conn);

        let record = create_monitoring(
            &store,
            &clock,
            NewMonitoring {
                patient_id,
                medication_ref: None,
                monitoring_type: MonitoringType::Renal,
                parameters: vec!["creatinine".into()],
                frequency: FrequencyMonths::new(3).ok(),
                start_date: date(2025, 5, 1),
            },
        )
        .unwrap();

        let updated =
            record_analysis(&store, &clock, &record, some_results(), date(2025, 6, 1)).unwrap();

        // Next analysis three months out: nothing pressing anymore.
        assert_eq!(updated.next_due_date, date(2025, 9, 1));
        assert_eq!(updated.priority, MonitoringPriority::Low);

        let loaded = get_monitoring_record(&conn, &record.id).unwrap();
        assert_eq!(loaded.last_analysis_date, Some(date(2025, 6, 1)));
        assert_eq!(loaded.priority, MonitoringPriority::Low);
    }
}
