use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::SequentialDocument;

/// Insert or update a document. A UNIQUE violation on `sequence_code`
/// surfaces as `DatabaseError::Conflict` so the allocation loop can
/// re-read and retry; every other failure passes through.
pub fn save_document(conn: &Connection, doc: &SequentialDocument) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, patient_id, kind, sequence_code, sequence_number,
         sequence_year, status, renewable, renewals_granted, renewals_remaining,
         start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             status = excluded.status,
             renewable = excluded.renewable,
             renewals_granted = excluded.renewals_granted,
             renewals_remaining = excluded.renewals_remaining,
             end_date = excluded.end_date",
        params![
            doc.id.to_string(),
            doc.patient_id.to_string(),
            doc.kind.as_str(),
            doc.sequence_code,
            doc.sequence_number,
            doc.sequence_year,
            doc.status.as_str(),
            doc.renewable as i32,
            doc.renewals_granted,
            doc.renewals_remaining,
            doc.start_date,
            doc.end_date,
            doc.created_at,
        ],
    )
    .map_err(|e| map_sequence_conflict(e, &doc.sequence_code))?;
    Ok(())
}

fn map_sequence_conflict(err: rusqlite::Error, code: &str) -> DatabaseError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("sequence_code") {
            return DatabaseError::Conflict {
                field: "documents.sequence_code".into(),
                value: code.to_string(),
            };
        }
    }
    DatabaseError::Sqlite(err)
}

/// Highest existing code for a prefix: latest year first, then the
/// largest numeric component within that year.
pub fn find_highest_sequence_code(
    conn: &Connection,
    prefix: &str,
) -> Result<Option<String>, DatabaseError> {
    let pattern = format!("{prefix}-%");
    let code = conn
        .query_row(
            "SELECT sequence_code FROM documents WHERE sequence_code LIKE ?1
             ORDER BY sequence_year DESC, sequence_number DESC LIMIT 1",
            params![pattern],
            |row| row.get::<_, String>(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(code)
}

pub fn exists_by_sequence_code(conn: &Connection, code: &str) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM documents WHERE sequence_code = ?1",
        params![code],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<SequentialDocument, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, kind, sequence_code, sequence_number, sequence_year,
         status, renewable, renewals_granted, renewals_remaining, start_date, end_date, created_at
         FROM documents WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![id.to_string()], |row| Ok(document_row(row)))?;
    match rows.next() {
        Some(row) => document_from_row(row??),
        None => Err(DatabaseError::NotFound {
            entity_type: "document".into(),
            id: id.to_string(),
        }),
    }
}

pub fn get_documents_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<SequentialDocument>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, kind, sequence_code, sequence_number, sequence_year,
         status, renewable, renewals_granted, renewals_remaining, start_date, end_date, created_at
         FROM documents WHERE patient_id = ?1
         ORDER BY sequence_year, sequence_number",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| Ok(document_row(row)))?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row??)?);
    }
    Ok(docs)
}

/// Active prescription codes for a patient, in sequence order — the
/// treatment list feeding the snapshot change-detector.
pub fn get_active_prescription_codes(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT sequence_code FROM documents
         WHERE patient_id = ?1 AND kind = 'prescription' AND status = 'active'
         ORDER BY sequence_year, sequence_number",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// Internal row type for SequentialDocument mapping
struct DocumentRow {
    id: String,
    patient_id: String,
    kind: String,
    sequence_code: String,
    sequence_number: i64,
    sequence_year: i32,
    status: String,
    renewable: i32,
    renewals_granted: u32,
    renewals_remaining: u32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    created_at: NaiveDateTime,
}

fn document_row(row: &rusqlite::Row<'_>) -> Result<DocumentRow, rusqlite::Error> {
    Ok(DocumentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        kind: row.get(2)?,
        sequence_code: row.get(3)?,
        sequence_number: row.get(4)?,
        sequence_year: row.get(5)?,
        status: row.get(6)?,
        renewable: row.get(7)?,
        renewals_granted: row.get(8)?,
        renewals_remaining: row.get(9)?,
        start_date: row.get(10)?,
        end_date: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<SequentialDocument, DatabaseError> {
    Ok(SequentialDocument {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        kind: DocumentKind::from_str(&row.kind)?,
        sequence_code: row.sequence_code,
        sequence_number: row.sequence_number,
        sequence_year: row.sequence_year,
        status: DocumentStatus::from_str(&row.status)?,
        renewable: row.renewable != 0,
        renewals_granted: row.renewals_granted,
        renewals_remaining: row.renewals_remaining,
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
    })
}
