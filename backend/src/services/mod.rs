//! Evaluation services for the weather alert evaluator

pub mod cycle;
pub mod evaluator;
pub mod fetcher;
pub mod grouping;
pub mod scheduler;
pub mod write_back;

pub use cycle::{AlertEvaluationService, CycleSummary, DependencyHealth};
pub use scheduler::Scheduler;
pub use write_back::WriteBackReport;
