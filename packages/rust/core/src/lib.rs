//! Pipeline orchestration and the merge engine.
//!
//! This crate provides:
//! - [`merge`] — combine per-source carrier maps, deduplicating in order
//! - [`pipeline`] — the concurrent fetch → merge → validate → commit run

pub mod merge;
pub mod pipeline;

pub use merge::merge;
pub use pipeline::{ProgressReporter, RunSummary, SilentProgress, sync_snapshot};
