//! The responder pipeline: data types and the cycle runner.

pub mod cycle;
pub mod types;

pub use cycle::{CycleReport, Responder};
pub use types::{CorrespondentIndex, extract_correspondent};
