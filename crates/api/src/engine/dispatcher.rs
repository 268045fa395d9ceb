//! Runner-facing job dispatch.

use predictcr_core::types::DbId;
use predictcr_db::models::job::DispatchedJob;
use predictcr_db::repositories::JobRepo;
use predictcr_db::DbPool;

use crate::error::AppResult;

/// Upper bound on the stored runner hostname.
const MAX_HOSTNAME_LEN: usize = 255;

/// Claim the oldest queued sample for `runner_id`, if any.
///
/// Timed-out samples are requeued in the same transaction before the claim,
/// so a runner polling an otherwise empty queue picks them up.
pub async fn dispatch_next(
    pool: &DbPool,
    runner_id: DbId,
    runner_hostname: &str,
) -> AppResult<Option<DispatchedJob>> {
    let hostname: String = runner_hostname.trim().chars().take(MAX_HOSTNAME_LEN).collect();
    let job = JobRepo::request_job(pool, runner_id, &hostname).await?;

    match &job {
        Some(job) => tracing::info!(
            job_id = job.job_id,
            sample_id = job.sample_id,
            runner_id,
            runner_hostname = %hostname,
            "Dispatched sample to runner",
        ),
        None => tracing::debug!(runner_id, "No queued samples"),
    }
    Ok(job)
}
