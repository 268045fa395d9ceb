//! Sample lifecycle engine.
//!
//! Thin orchestration between handlers, repositories and on-disk storage:
//! - [`submission`] -- validates an upload, runs the quota gate, stores inputs.
//! - [`dispatcher`] -- hands queued samples to polling runners.
//! - [`results`] -- records job outcomes and stores result archives.

pub mod dispatcher;
pub mod results;
pub mod submission;
