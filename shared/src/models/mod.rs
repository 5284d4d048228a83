//! Domain models for the weather alert evaluator

mod alert;
mod weather;

pub use alert::*;
pub use weather::*;
