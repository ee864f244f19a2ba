pub mod backend;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod validate;

pub use backend::*;
pub use extract::*;
pub use orchestrator::*;
pub use prompt::*;
pub use validate::*;

use thiserror::Error;

use crate::db::DatabaseError;

/// Failure modes of a consultation-generation run. Every variant is
/// terminal for the request that produced it; the pipeline never retries.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Patient {0} not found")]
    PatientNotFound(i64),

    #[error("Clinical text is empty")]
    EmptyInput,

    #[error("Document could not be read: {0}")]
    UnreadableDocument(String),

    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Generation backend rejected the request (status {status}): {body}")]
    BackendRejected { status: u16, body: String },

    #[error("Malformed generation response: {reason}")]
    MalformedGeneration {
        reason: String,
        /// The exact text the model produced, kept for operator inspection.
        raw_response: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
