pub mod consultations;
pub mod generate;
pub mod health;
pub mod patients;
