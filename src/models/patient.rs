use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A patient record. `health_history` is the free-text clinical source the
/// generation pipeline reads; the pipeline never mutates a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub dob: Option<NaiveDate>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub billing_address: Option<String>,
    pub health_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub chronic_diseases: Option<String>,
    pub financial_support: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a patient.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub gender: String,
    pub dob: Option<NaiveDate>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub billing_address: Option<String>,
    pub health_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub chronic_diseases: Option<String>,
    #[serde(default)]
    pub financial_support: bool,
}

/// Partial update: absent fields keep their stored values.
///
/// Updates are set-only. An explicit JSON `null` is indistinguishable from
/// an absent field and also keeps the stored value, so nullable fields like
/// `billing_address` cannot be cleared through this type. A `dob` that is
/// not a valid ISO date is rejected during deserialization (422).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub billing_address: Option<String>,
    pub health_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub chronic_diseases: Option<String>,
    pub financial_support: Option<bool>,
}
