//! Consultation-generation endpoints — the HTTP face of the pipeline.
//!
//! Two modes:
//! - `POST /generate_observation` — JSON body, uses the stored history.
//! - `POST /upload_pdf_and_generate_observation` — multipart, uses text
//!   extracted from the uploaded PDF.
//!
//! The pipeline blocks on the generation call and on SQLite, so each run
//! executes inside `spawn_blocking` and never stalls the async workers.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::orchestrator::{ClinicalSource, ConsultationPipeline, PipelineOutcome};
use crate::pipeline::validate::GeneratedObservation;

/// Maximum accepted PDF size in bytes (10 MB).
const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub patient_id: i64,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub message: &'static str,
    pub consultation_id: i64,
    pub observation: GeneratedObservation,
}

impl From<PipelineOutcome> for GenerateResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        Self {
            message: "Observation generated",
            consultation_id: outcome.consultation.id,
            observation: outcome.observation,
        }
    }
}

/// `POST /generate_observation` — generate a note from the stored history.
pub async fn from_history(
    State(ctx): State<ApiContext>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let outcome = run_pipeline(ctx, req.patient_id, ClinicalSource::StoredHistory).await?;
    Ok(Json(outcome.into()))
}

/// `POST /upload_pdf_and_generate_observation` — generate a note from an
/// uploaded clinical report.
pub async fn from_document(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, ApiError> {
    let mut patient_id: Option<i64> = None;
    let mut pdf_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("patient_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid patient_id: {e}")))?;
                patient_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::BadRequest("patient_id must be an integer".into()))?,
                );
            }
            Some("pdf_file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid pdf_file: {e}")))?;
                if bytes.len() > MAX_PDF_BYTES {
                    return Err(ApiError::BadRequest(format!(
                        "PDF exceeds maximum size of {MAX_PDF_BYTES} bytes"
                    )));
                }
                pdf_bytes = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let patient_id =
        patient_id.ok_or_else(|| ApiError::BadRequest("Missing patient_id field".into()))?;
    let pdf_bytes =
        pdf_bytes.ok_or_else(|| ApiError::BadRequest("Missing pdf_file field".into()))?;

    let outcome = run_pipeline(ctx, patient_id, ClinicalSource::UploadedDocument(pdf_bytes)).await?;
    Ok(Json(outcome.into()))
}

async fn run_pipeline(
    ctx: ApiContext,
    patient_id: i64,
    source: ClinicalSource,
) -> Result<PipelineOutcome, ApiError> {
    tokio::task::spawn_blocking(move || -> Result<PipelineOutcome, ApiError> {
        let conn = ctx.open_db()?;
        let pipeline =
            ConsultationPipeline::new(&conn, ctx.backend.as_ref(), &ctx.model, ctx.params);
        pipeline.run(patient_id, source).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))?
}
