pub mod consultation;
pub mod patient;

pub use consultation::*;
pub use patient::*;
