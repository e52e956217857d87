use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::{FrequencyMonths, MonitoringRecord};

/// Insert or update a monitoring record. `parameters` and `last_results`
/// are JSON-encoded here, at the persistence boundary only.
pub fn save_monitoring_record(
    conn: &Connection,
    record: &MonitoringRecord,
) -> Result<(), DatabaseError> {
    let parameters = serde_json::to_string(&record.parameters)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let last_results = record
        .last_results
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO monitoring_records (id, patient_id, medication_ref, monitoring_type,
         parameters, frequency_months, start_date, last_analysis_date, next_due_date,
         last_results, status, priority, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             medication_ref = excluded.medication_ref,
             monitoring_type = excluded.monitoring_type,
             parameters = excluded.parameters,
             frequency_months = excluded.frequency_months,
             last_analysis_date = excluded.last_analysis_date,
             next_due_date = excluded.next_due_date,
             last_results = excluded.last_results,
             status = excluded.status,
             priority = excluded.priority",
        params![
            record.id.to_string(),
            record.patient_id.to_string(),
            record.medication_ref,
            record.monitoring_type.as_str(),
            parameters,
            record.frequency.months(),
            record.start_date,
            record.last_analysis_date,
            record.next_due_date,
            last_results,
            record.status.as_str(),
            record.priority.as_str(),
            record.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_monitoring_record(
    conn: &Connection,
    id: &Uuid,
) -> Result<MonitoringRecord, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, medication_ref, monitoring_type, parameters, frequency_months,
         start_date, last_analysis_date, next_due_date, last_results, status, priority, created_at
         FROM monitoring_records WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![id.to_string()], |row| Ok(monitoring_row(row)))?;
    match rows.next() {
        Some(row) => monitoring_from_row(row??),
        None => Err(DatabaseError::NotFound {
            entity_type: "monitoring_record".into(),
            id: id.to_string(),
        }),
    }
}

/// Records still under surveillance (active or pending) for one patient.
pub fn get_open_monitoring_records(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<MonitoringRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, medication_ref, monitoring_type, parameters, frequency_months,
         start_date, last_analysis_date, next_due_date, last_results, status, priority, created_at
         FROM monitoring_records
         WHERE patient_id = ?1 AND status IN ('active', 'pending')
         ORDER BY next_due_date",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| Ok(monitoring_row(row)))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(monitoring_from_row(row??)?);
    }
    Ok(records)
}

/// All open records across patients, soonest due first — the input to
/// the due-list computation.
pub fn get_all_open_monitoring_records(
    conn: &Connection,
) -> Result<Vec<MonitoringRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, medication_ref, monitoring_type, parameters, frequency_months,
         start_date, last_analysis_date, next_due_date, last_results, status, priority, created_at
         FROM monitoring_records
         WHERE status IN ('active', 'pending')
         ORDER BY next_due_date",
    )?;

    let rows = stmt.query_map([], |row| Ok(monitoring_row(row)))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(monitoring_from_row(row??)?);
    }
    Ok(records)
}

// Internal row type for MonitoringRecord mapping
struct MonitoringRow {
    id: String,
    patient_id: String,
    medication_ref: Option<String>,
    monitoring_type: String,
    parameters: String,
    frequency_months: u8,
    start_date: NaiveDate,
    last_analysis_date: Option<NaiveDate>,
    next_due_date: NaiveDate,
    last_results: Option<String>,
    status: String,
    priority: String,
    created_at: NaiveDateTime,
}

fn monitoring_row(row: &rusqlite::Row<'_>) -> Result<MonitoringRow, rusqlite::Error> {
    Ok(MonitoringRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        medication_ref: row.get(2)?,
        monitoring_type: row.get(3)?,
        parameters: row.get(4)?,
        frequency_months: row.get(5)?,
        start_date: row.get(6)?,
        last_analysis_date: row.get(7)?,
        next_due_date: row.get(8)?,
        last_results: row.get(9)?,
        status: row.get(10)?,
        priority: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn monitoring_from_row(row: MonitoringRow) -> Result<MonitoringRecord, DatabaseError> {
    let parameters: Vec<String> = serde_json::from_str(&row.parameters)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let last_results = row
        .last_results
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    Ok(MonitoringRecord {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        medication_ref: row.medication_ref,
        monitoring_type: MonitoringType::from_str(&row.monitoring_type)?,
        parameters,
        frequency: FrequencyMonths::new(row.frequency_months).map_err(|e| {
            DatabaseError::InvalidEnum {
                field: "frequency_months".into(),
                value: e.months.to_string(),
            }
        })?,
        start_date: row.start_date,
        last_analysis_date: row.last_analysis_date,
        next_due_date: row.next_due_date,
        last_results,
        status: MonitoringStatus::from_str(&row.status)?,
        priority: MonitoringPriority::from_str(&row.priority)?,
        created_at: row.created_at,
    })
}
