//! Runner client for the sample-processing API.
//!
//! A runner polls the server for queued samples, downloads their inputs,
//! runs the analysis script in a scratch directory and uploads the three
//! result archives (or a failure report) back.

pub mod backoff;
pub mod client;
pub mod executor;
pub mod poller;
