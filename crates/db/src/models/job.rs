//! Job entity models and DTOs.
//!
//! A job is the audit record of one dispatch attempt of a sample to a
//! runner. Resubmitting a sample creates a new job on the next dispatch.

use predictcr_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::sample::Sample;
use super::status::{JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub sample_id: DbId,
    /// User id of the runner account that claimed the sample.
    pub runner_id: Option<DbId>,
    pub runner_hostname: String,
    pub status_id: StatusId,
    pub error_message: Option<String>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_id(self.status_id)
    }
}

/// API representation: the row plus its resolved status name.
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub status: &'static str,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let status = job.status().map_or("unknown", JobStatus::name);
        Self { job, status }
    }
}

/// What a runner receives from a successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchedJob {
    pub job_id: DbId,
    pub sample_id: DbId,
}

/// Query parameters for `GET /api/v1/admin/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by status ID (e.g. 2 = running, 4 = failed).
    pub status_id: Option<StatusId>,
    /// Filter by sample.
    pub sample_id: Option<DbId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Why a result upload was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultRejection {
    #[error("Unknown sample id {0}")]
    UnknownSample(DbId),

    #[error("Unknown job id {0}")]
    UnknownJob(DbId),

    /// The job was dispatched for a different sample.
    #[error("Job {job_id} does not belong to sample {sample_id}")]
    SampleMismatch { job_id: DbId, sample_id: DbId },

    /// The sample already has results or the job is already finished.
    #[error("Sample {sample_id} already has results")]
    AlreadyRecorded { sample_id: DbId },
}

/// Rows locked for recording a result.
#[derive(Debug)]
pub struct LockedResult {
    pub job: Job,
    pub sample: Sample,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages() {
        assert_eq!(ResultRejection::UnknownSample(4).to_string(), "Unknown sample id 4");
        assert_eq!(ResultRejection::UnknownJob(2).to_string(), "Unknown job id 2");
        assert_eq!(
            ResultRejection::SampleMismatch {
                job_id: 2,
                sample_id: 4
            }
            .to_string(),
            "Job 2 does not belong to sample 4"
        );
        assert_eq!(
            ResultRejection::AlreadyRecorded { sample_id: 4 }.to_string(),
            "Sample 4 already has results"
        );
    }

    #[test]
    fn rejection_is_an_error() {
        let err: Box<dyn std::error::Error> = Box::new(ResultRejection::UnknownJob(1));
        assert_eq!(err.to_string(), "Unknown job id 1");
    }
}
