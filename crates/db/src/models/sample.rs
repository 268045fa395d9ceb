//! Sample entity model and DTOs.

use predictcr_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{SampleStatus, StatusId};

/// A row from the `samples` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sample {
    pub id: DbId,
    /// Email of the submitting user.
    pub email: String,
    pub name: String,
    pub tumor_type: String,
    pub source: String,
    pub platform: String,
    pub status_id: StatusId,
    pub has_results: bool,
    pub error_message: Option<String>,
    pub submitted_at: Timestamp,
    pub job_started_at: Option<Timestamp>,
    pub job_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Sample {
    pub fn status(&self) -> Option<SampleStatus> {
        SampleStatus::from_id(self.status_id)
    }
}

/// API representation: the row plus its resolved status name.
#[derive(Debug, Clone, Serialize)]
pub struct SampleResponse {
    #[serde(flatten)]
    pub sample: Sample,
    pub status: &'static str,
}

impl From<Sample> for SampleResponse {
    fn from(sample: Sample) -> Self {
        let status = sample.status().map_or("unknown", SampleStatus::name);
        Self { sample, status }
    }
}

/// DTO for a new submission. The owner is taken from the authenticated user.
#[derive(Debug, Clone)]
pub struct NewSample {
    pub email: String,
    pub name: String,
    pub tumor_type: String,
    pub source: String,
    pub platform: String,
}

/// Result of passing a submission through the quota gate.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Counters were decremented and the sample inserted. The surrounding
    /// transaction still has to be committed by the caller.
    Accepted(Sample),
    /// The gate refused the submission; nothing was written.
    Rejected(predictcr_core::quota::QuotaRejection),
}
