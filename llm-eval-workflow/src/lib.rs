//! Experiment execution
//!
//! [`ExperimentRunner`] drives one run of an experiment: generation against the
//! experiment's model for every test case, grading, persistence of per-case
//! results, and the run-level aggregate. [`RunFinalizer`] guarantees the run
//! row is stamped complete even when the run future is dropped early.

pub mod finalizer;
pub mod runner;
pub mod summary;

pub use finalizer::RunFinalizer;
pub use runner::{ExperimentRunner, DEFAULT_MAX_CONCURRENCY};
pub use summary::{load_run_summary, recompute_aggregate, RunSummary};
