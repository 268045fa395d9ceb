//! Domain types and pure business rules shared by the API server, the
//! database layer, and the runner.

pub mod error;
pub mod quota;
pub mod results;
pub mod roles;
pub mod types;
pub mod validation;
