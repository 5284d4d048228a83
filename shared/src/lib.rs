//! Shared types and models for the weather alert evaluator
//!
//! This crate contains the alert and weather data shapes exchanged with the
//! alert store and the weather service, plus the pure extraction and
//! comparison logic the evaluation cycle is built on.

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
