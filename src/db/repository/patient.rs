use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use super::super::DatabaseError;
use crate::models::{NewPatient, Patient, PatientUpdate};

const PATIENT_COLUMNS: &str = "id, name, gender, dob, address, phone, email, billing_address,
     health_history, allergies, medications, chronic_diseases, financial_support, created_at";

pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, gender, dob, address, phone, email, billing_address,
         health_history, allergies, medications, chronic_diseases, financial_support, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            patient.name,
            patient.gender,
            patient.dob.map(|d| d.to_string()),
            patient.address,
            patient.phone,
            patient.email,
            patient.billing_address,
            patient.health_history,
            patient.allergies,
            patient.medications,
            patient.chronic_diseases,
            patient.financial_support as i32,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], read_patient_row);

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"
    ))?;
    let rows = stmt.query_map([], read_patient_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Apply a partial update. Returns the updated record, or `None` if the
/// patient does not exist. Set-only: `None` fields keep their stored
/// values, so a nullable column can never be reset to NULL here.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    update: &PatientUpdate,
) -> Result<Option<Patient>, DatabaseError> {
    let Some(current) = get_patient(conn, id)? else {
        return Ok(None);
    };

    let merged = Patient {
        id: current.id,
        name: update.name.clone().unwrap_or(current.name),
        gender: update.gender.clone().unwrap_or(current.gender),
        dob: update.dob.or(current.dob),
        address: update.address.clone().unwrap_or(current.address),
        phone: update.phone.clone().unwrap_or(current.phone),
        email: update.email.clone().unwrap_or(current.email),
        billing_address: update.billing_address.clone().or(current.billing_address),
        health_history: update.health_history.clone().or(current.health_history),
        allergies: update.allergies.clone().or(current.allergies),
        medications: update.medications.clone().or(current.medications),
        chronic_diseases: update.chronic_diseases.clone().or(current.chronic_diseases),
        financial_support: update.financial_support.unwrap_or(current.financial_support),
        created_at: current.created_at,
    };

    conn.execute(
        "UPDATE patients SET name = ?1, gender = ?2, dob = ?3, address = ?4, phone = ?5,
         email = ?6, billing_address = ?7, health_history = ?8, allergies = ?9,
         medications = ?10, chronic_diseases = ?11, financial_support = ?12
         WHERE id = ?13",
        params![
            merged.name,
            merged.gender,
            merged.dob.map(|d| d.to_string()),
            merged.address,
            merged.phone,
            merged.email,
            merged.billing_address,
            merged.health_history,
            merged.allergies,
            merged.medications,
            merged.chronic_diseases,
            merged.financial_support as i32,
            id,
        ],
    )?;

    Ok(Some(merged))
}

/// Delete a patient. Returns false if the id was unknown.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// Internal row type for Patient mapping
struct PatientRow {
    id: i64,
    name: String,
    gender: String,
    dob: Option<String>,
    address: String,
    phone: String,
    email: String,
    billing_address: Option<String>,
    health_history: Option<String>,
    allergies: Option<String>,
    medications: Option<String>,
    chronic_diseases: Option<String>,
    financial_support: i32,
    created_at: String,
}

fn read_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: row.get(2)?,
        dob: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        billing_address: row.get(7)?,
        health_history: row.get(8)?,
        allergies: row.get(9)?,
        medications: row.get(10)?,
        chronic_diseases: row.get(11)?,
        financial_support: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    let dob = match row.dob {
        Some(s) => Some(
            NaiveDate::from_str(&s).map_err(|_| DatabaseError::InvalidField {
                field: "dob".into(),
                value: s,
            })?,
        ),
        None => None,
    };

    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|_| DatabaseError::InvalidField {
            field: "created_at".into(),
            value: row.created_at.clone(),
        })?
        .with_timezone(&Utc);

    Ok(Patient {
        id: row.id,
        name: row.name,
        gender: row.gender,
        dob,
        address: row.address,
        phone: row.phone,
        email: row.email,
        billing_address: row.billing_address,
        health_history: row.health_history,
        allergies: row.allergies,
        medications: row.medications,
        chronic_diseases: row.chronic_diseases,
        financial_support: row.financial_support != 0,
        created_at,
    })
}
