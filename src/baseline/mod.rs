//! Baseline topology: versioned storage and validated mutations.

pub mod mutation;
pub mod report;
pub mod store;

pub use mutation::{BaselineChange, BaselineMutationEngine, MutationOutcome};
pub use report::BaselineReport;
pub use store::{BaselineStore, BaselineTopology, DEFAULT_HISTORY_SIZE};
