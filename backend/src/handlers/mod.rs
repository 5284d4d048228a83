//! HTTP request handlers

pub mod evaluation;
pub mod health;

pub use evaluation::*;
pub use health::*;
