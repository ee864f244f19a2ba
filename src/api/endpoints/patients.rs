//! Patient CRUD endpoints — external collaborators of the generation
//! pipeline, kept to plain relational plumbing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::patient;
use crate::models::{NewPatient, Patient, PatientUpdate};

#[derive(Serialize)]
pub struct PatientCreatedResponse {
    pub message: &'static str,
    pub patient_id: i64,
}

/// `POST /patients` — create a patient record.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewPatient>,
) -> Result<(StatusCode, Json<PatientCreatedResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient name cannot be empty".into()));
    }

    let conn = ctx.open_db()?;
    let patient_id = patient::insert_patient(&conn, &payload)?;

    tracing::info!(patient_id, "patient created");
    Ok((
        StatusCode::CREATED,
        Json(PatientCreatedResponse {
            message: "Patient created",
            patient_id,
        }),
    ))
}

/// `GET /patients` — list all patients.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.open_db()?;
    let patients = patient::list_patients(&conn)?;
    Ok(Json(patients))
}

/// `GET /patients/:id` — fetch one patient.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.open_db()?;
    let found = patient::get_patient(&conn, id)?.ok_or(ApiError::PatientNotFound(id))?;
    Ok(Json(found))
}

#[derive(Serialize)]
pub struct PatientUpdatedResponse {
    pub message: &'static str,
    pub patient: Patient,
}

/// `PUT /patients/:id` — partial update; absent fields keep their values.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<PatientUpdate>,
) -> Result<Json<PatientUpdatedResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let updated =
        patient::update_patient(&conn, id, &payload)?.ok_or(ApiError::PatientNotFound(id))?;

    Ok(Json(PatientUpdatedResponse {
        message: "Patient updated successfully",
        patient: updated,
    }))
}

#[derive(Serialize)]
pub struct PatientDeletedResponse {
    pub message: &'static str,
}

/// `DELETE /patients/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<PatientDeletedResponse>, ApiError> {
    let conn = ctx.open_db()?;
    if !patient::delete_patient(&conn, id)? {
        return Err(ApiError::PatientNotFound(id));
    }

    tracing::info!(patient_id = id, "patient deleted");
    Ok(Json(PatientDeletedResponse {
        message: "Patient deleted successfully",
    }))
}
