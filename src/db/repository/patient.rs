use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;
use crate::snapshot::SnapshotInputs;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, birth_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.birth_date,
            patient.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, birth_date, created_at FROM patients WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<NaiveDate>>(3)?,
            row.get::<_, NaiveDateTime>(4)?,
        ))
    })?;

    match rows.next() {
        Some(row) => {
            let (id_str, first_name, last_name, birth_date, created_at) = row?;
            Ok(Patient {
                id: Uuid::parse_str(&id_str)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                first_name,
                last_name,
                birth_date,
                created_at,
            })
        }
        None => Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        }),
    }
}

/// Assemble the change-detector inputs for one patient: identity fields,
/// the active treatment list, and the document roll-up (latest creation
/// timestamp + count). One query path, fixed ordering, so identical
/// clinical state always produces identical inputs.
pub fn snapshot_inputs(conn: &Connection, patient_id: &Uuid) -> Result<SnapshotInputs, DatabaseError> {
    let patient = get_patient(conn, patient_id)?;

    let active_treatments =
        super::document::get_active_prescription_codes(conn, patient_id)?;

    let (document_count, latest_document_at) = conn.query_row(
        "SELECT COUNT(*), MAX(created_at) FROM documents WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, Option<NaiveDateTime>>(1)?,
            ))
        },
    )?;

    Ok(SnapshotInputs {
        patient_id: patient.id,
        full_name: patient.full_name(),
        birth_date: patient.birth_date,
        active_treatments,
        latest_document_at,
        document_count,
    })
}
