use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::consultation::list_consultations_for_patient;
use crate::db::repository::patient::get_patient;
use crate::models::Consultation;

#[derive(Serialize)]
pub struct ConsultationsResponse {
    pub patient_id: i64,
    pub consultations: Vec<Consultation>,
}

/// `GET /patients/:id/consultations` — a patient's notes, newest first.
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<i64>,
) -> Result<Json<ConsultationsResponse>, ApiError> {
    let conn = ctx.open_db()?;

    if get_patient(&conn, patient_id)?.is_none() {
        return Err(ApiError::PatientNotFound(patient_id));
    }

    let consultations = list_consultations_for_patient(&conn, patient_id)?;
    Ok(Json(ConsultationsResponse {
        patient_id,
        consultations,
    }))
}
