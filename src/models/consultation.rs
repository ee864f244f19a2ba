use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One clinical note, linked to exactly one patient.
///
/// Rows are immutable once written: the pipeline appends, never edits.
/// `observation` holds the serialized validated structure for generated
/// notes. `treatment_plan` and `follow_up_reminder` exist in the schema
/// but are never written by the generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub date: DateTime<Utc>,
    pub observation: String,
    pub treatment_plan: Option<String>,
    pub follow_up_reminder: Option<String>,
}
