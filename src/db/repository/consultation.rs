use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::super::DatabaseError;
use crate::models::Consultation;

/// Append one consultation for a patient and return the stored record.
///
/// The id and timestamp are server-assigned. The single INSERT is the only
/// side effect; the foreign key on `patient_id` rejects dangling references
/// even if the caller skipped its own existence check.
pub fn insert_consultation(
    conn: &Connection,
    patient_id: i64,
    observation: &str,
) -> Result<Consultation, DatabaseError> {
    let date = Utc::now();

    conn.execute(
        "INSERT INTO consultations (patient_id, date, observation) VALUES (?1, ?2, ?3)",
        params![patient_id, date.to_rfc3339(), observation],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "consultations.patient_id references missing patient {patient_id}"
            ))
        }
        other => other.into(),
    })?;

    Ok(Consultation {
        id: conn.last_insert_rowid(),
        patient_id,
        date,
        observation: observation.to_string(),
        treatment_plan: None,
        follow_up_reminder: None,
    })
}

pub fn get_consultation(conn: &Connection, id: i64) -> Result<Option<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, date, observation, treatment_plan, follow_up_reminder
         FROM consultations WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id], read_consultation_row);

    match result {
        Ok(row) => Ok(Some(consultation_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All consultations for one patient, newest first.
pub fn list_consultations_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, date, observation, treatment_plan, follow_up_reminder
         FROM consultations WHERE patient_id = ?1 ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], read_consultation_row)?;

    let mut consultations = Vec::new();
    for row in rows {
        consultations.push(consultation_from_row(row?)?);
    }
    Ok(consultations)
}

pub fn count_consultations(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM consultations", [], |row| row.get(0))?;
    Ok(count)
}

// Internal row type for Consultation mapping
struct ConsultationRow {
    id: i64,
    patient_id: i64,
    date: String,
    observation: String,
    treatment_plan: Option<String>,
    follow_up_reminder: Option<String>,
}

fn read_consultation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsultationRow> {
    Ok(ConsultationRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        observation: row.get(3)?,
        treatment_plan: row.get(4)?,
        follow_up_reminder: row.get(5)?,
    })
}

fn consultation_from_row(row: ConsultationRow) -> Result<Consultation, DatabaseError> {
    let date = DateTime::parse_from_rfc3339(&row.date)
        .map_err(|_| DatabaseError::InvalidField {
            field: "date".into(),
            value: row.date.clone(),
        })?
        .with_timezone(&Utc);

    Ok(Consultation {
        id: row.id,
        patient_id: row.patient_id,
        date,
        observation: row.observation,
        treatment_plan: row.treatment_plan,
        follow_up_reminder: row.follow_up_reminder,
    })
}
