use rusqlite::Connection;

use super::backend::{GenerationBackend, GenerationParams};
use super::extract::extract_document_text;
use super::prompt::{build_observation_prompt, PromptMode, OBSERVATION_SYSTEM_PROMPT};
use super::validate::{parse_generated_observation, GeneratedObservation};
use super::PipelineError;
use crate::db::repository::consultation::insert_consultation;
use crate::db::repository::patient::get_patient;
use crate::models::Consultation;

/// The clinical text source for one generation request.
pub enum ClinicalSource {
    /// Use the patient's stored `health_history` field.
    StoredHistory,
    /// Extract text from an uploaded PDF.
    UploadedDocument(Vec<u8>),
}

/// Result of a successful pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The persisted row. Its `observation` column holds the serialized
    /// validated structure.
    pub consultation: Consultation,
    pub observation: GeneratedObservation,
}

/// Runs the full consultation-generation sequence for one request:
/// resolve patient → resolve clinical text → prompt → generate →
/// validate → persist.
///
/// Each step's failure short-circuits the rest; a consultation row is
/// written only after every prior step succeeded, so a failed run leaves
/// no trace in storage. There is no retry at this level; a caller that
/// wants another attempt issues a new request.
pub struct ConsultationPipeline<'a> {
    conn: &'a Connection,
    backend: &'a dyn GenerationBackend,
    model: &'a str,
    params: GenerationParams,
}

impl<'a> ConsultationPipeline<'a> {
    pub fn new(
        conn: &'a Connection,
        backend: &'a dyn GenerationBackend,
        model: &'a str,
        params: GenerationParams,
    ) -> Self {
        Self {
            conn,
            backend,
            model,
            params,
        }
    }

    pub fn run(
        &self,
        patient_id: i64,
        source: ClinicalSource,
    ) -> Result<PipelineOutcome, PipelineError> {
        let _span = tracing::info_span!("generate_consultation", patient_id).entered();

        // Step 1: the patient must exist before anything else happens.
        let patient = get_patient(self.conn, patient_id)?
            .ok_or(PipelineError::PatientNotFound(patient_id))?;

        // Step 2: resolve the clinical text. Empty text fails here, before
        // any model call is attempted.
        let (clinical_text, mode) = match source {
            ClinicalSource::StoredHistory => {
                let history = patient.health_history.unwrap_or_default();
                (history, PromptMode::History)
            }
            ClinicalSource::UploadedDocument(bytes) => {
                let text = extract_document_text(&bytes)?;
                (text, PromptMode::Document)
            }
        };

        // Step 3: build the prompt (rejects empty clinical text).
        let prompt = build_observation_prompt(&clinical_text, mode)?;

        // Step 4: one generation attempt.
        let raw = self
            .backend
            .generate(self.model, &prompt, OBSERVATION_SYSTEM_PROMPT, &self.params)
            .inspect_err(|e| {
                tracing::warn!(patient_id, error = %e, "generation call failed");
            })?;

        // Step 5: validate against the three-field contract. A response
        // the system cannot verify is never persisted.
        let observation = parse_generated_observation(&raw).inspect_err(|e| {
            tracing::warn!(patient_id, error = %e, "model response failed validation");
        })?;

        // Step 6: persist the serialized validated structure.
        let serialized = serde_json::to_string(&observation).map_err(|e| {
            PipelineError::MalformedGeneration {
                reason: format!("could not reserialize validated note: {e}"),
                raw_response: raw,
            }
        })?;
        let consultation = insert_consultation(self.conn, patient.id, &serialized)?;

        tracing::info!(
            patient_id,
            consultation_id = consultation.id,
            "consultation note persisted"
        );

        Ok(PipelineOutcome {
            consultation,
            observation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::consultation::count_consultations;
    use crate::db::repository::patient::insert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::NewPatient;
    use crate::pipeline::backend::MockBackend;
    use chrono::Utc;

    const VALID_RESPONSE: &str = r#"{"observation":"Akute Zahnschmerzen","affected_teeth":["16"],"recommendation":"Röntgenaufnahme empfohlen"}"#;

    fn params() -> GenerationParams {
        GenerationParams {
            max_tokens: 256,
            temperature: 0.2,
        }
    }

    fn patient_with_history(conn: &Connection, history: Option<&str>) -> i64 {
        let new = NewPatient {
            name: "Erika Mustermann".into(),
            gender: "weiblich".into(),
            dob: None,
            address: "Musterstraße 1".into(),
            phone: "030".into(),
            email: "erika@example.com".into(),
            billing_address: None,
            health_history: history.map(str::to_string),
            allergies: None,
            medications: None,
            chronic_diseases: None,
            financial_support: false,
        };
        insert_patient(conn, &new).unwrap()
    }

    #[test]
    fn history_run_persists_exactly_one_row() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, Some("Zahnschmerzen seit 3 Tagen"));
        let backend = MockBackend::new(VALID_RESPONSE);

        let before = Utc::now();
        let outcome = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::StoredHistory)
            .unwrap();
        let after = Utc::now();

        assert_eq!(outcome.consultation.patient_id, patient_id);
        assert!(outcome.consultation.date >= before && outcome.consultation.date <= after);
        assert_eq!(outcome.observation.observation, "Akute Zahnschmerzen");
        assert_eq!(outcome.observation.affected_teeth, vec!["16".to_string()]);
        assert_eq!(count_consultations(&conn).unwrap(), 1);

        // The stored text is the serialized validated structure.
        let stored: GeneratedObservation =
            serde_json::from_str(&outcome.consultation.observation).unwrap();
        assert_eq!(stored, outcome.observation);
    }

    #[test]
    fn unknown_patient_fails_without_model_call() {
        let conn = open_memory_database().unwrap();
        let backend = MockBackend::new(VALID_RESPONSE);

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(999, ClinicalSource::StoredHistory);

        assert!(matches!(result, Err(PipelineError::PatientNotFound(999))));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }

    #[test]
    fn empty_history_fails_before_generation() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, None);
        let backend = MockBackend::new(VALID_RESPONSE);

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::StoredHistory);

        assert!(matches!(result, Err(PipelineError::EmptyInput)));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }

    #[test]
    fn whitespace_history_counts_as_empty() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, Some("   \n"));
        let backend = MockBackend::new(VALID_RESPONSE);

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::StoredHistory);

        assert!(matches!(result, Err(PipelineError::EmptyInput)));
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn malformed_response_is_never_persisted() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, Some("Zahnschmerzen seit 3 Tagen"));
        let backend = MockBackend::new("Sorry, I cannot help.");

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::StoredHistory);

        match result {
            Err(PipelineError::MalformedGeneration { raw_response, .. }) => {
                assert_eq!(raw_response, "Sorry, I cannot help.");
            }
            other => panic!("expected MalformedGeneration, got {other:?}"),
        }
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }

    #[test]
    fn backend_failure_leaves_no_row() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, Some("Zahnschmerzen seit 3 Tagen"));
        let backend = MockBackend::unavailable("connection refused");

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::StoredHistory);

        assert!(matches!(
            result,
            Err(PipelineError::GenerationUnavailable(_))
        ));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }

    #[test]
    fn document_run_persists_exactly_one_row() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, None);
        let backend = MockBackend::new(VALID_RESPONSE);
        let pdf_bytes = crate::pipeline::extract::make_test_pdf("Zahnschmerzen im Oberkiefer");

        let outcome = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::UploadedDocument(pdf_bytes))
            .unwrap();

        assert_eq!(outcome.consultation.patient_id, patient_id);
        assert_eq!(outcome.observation.observation, "Akute Zahnschmerzen");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(count_consultations(&conn).unwrap(), 1);
    }

    #[test]
    fn document_without_text_layer_counts_as_empty() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, Some("Zahnschmerzen seit 3 Tagen"));
        let backend = MockBackend::new(VALID_RESPONSE);
        let pdf_bytes = crate::pipeline::extract::make_test_pdf("");

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params())
            .run(patient_id, ClinicalSource::UploadedDocument(pdf_bytes));

        assert!(matches!(result, Err(PipelineError::EmptyInput)));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }

    #[test]
    fn unreadable_document_fails_before_generation() {
        let conn = open_memory_database().unwrap();
        let patient_id = patient_with_history(&conn, None);
        let backend = MockBackend::new(VALID_RESPONSE);

        let result = ConsultationPipeline::new(&conn, &backend, "gpt-4o-mini", params()).run(
            patient_id,
            ClinicalSource::UploadedDocument(b"not a pdf".to_vec()),
        );

        assert!(matches!(
            result,
            Err(PipelineError::UnreadableDocument(_))
        ));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(count_consultations(&conn).unwrap(), 0);
    }
}
