//! Recording job outcomes uploaded by runners.

use axum::body::Bytes;
use predictcr_core::error::CoreError;
use predictcr_core::results::ResultTier;
use predictcr_core::types::DbId;
use predictcr_db::models::job::ResultRejection;
use predictcr_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A parsed `POST /runner/result` upload.
#[derive(Debug)]
pub struct ResultUpload {
    pub job_id: DbId,
    pub sample_id: DbId,
    pub success: bool,
    pub error_message: Option<String>,
    pub runner_hostname: Option<String>,
    /// Archives keyed by tier, in whatever order they arrived.
    pub artifacts: Vec<(ResultTier, Bytes)>,
}

impl ResultUpload {
    /// A successful upload must carry every tier.
    fn check_artifacts(&self) -> AppResult<()> {
        if !self.success {
            return Ok(());
        }
        for tier in ResultTier::ALL {
            if !self.artifacts.iter().any(|(t, _)| *t == tier) {
                return Err(AppError::BadRequest(format!(
                    "Result has success=true but no {} file",
                    tier.field_name()
                )));
            }
        }
        Ok(())
    }
}

impl From<ResultRejection> for AppError {
    fn from(rejection: ResultRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            ResultRejection::UnknownSample(_) | ResultRejection::UnknownJob(_) => {
                AppError::NotFound(message)
            }
            ResultRejection::SampleMismatch { .. } => AppError::BadRequest(message),
            ResultRejection::AlreadyRecorded { .. } => {
                AppError::Core(CoreError::Conflict(message))
            }
        }
    }
}

/// Validate and record a job outcome.
///
/// Job and sample rows are locked (sample first), archives are written to
/// storage, and both rows transition together in one transaction. Rejected
/// uploads leave the database and storage untouched.
pub async fn process_result(state: &AppState, upload: ResultUpload) -> AppResult<()> {
    upload.check_artifacts()?;

    let mut tx = state.pool.begin().await?;
    let locked = match JobRepo::lock_for_result(&mut *tx, upload.job_id, upload.sample_id).await? {
        Ok(locked) => locked,
        Err(rejection) => {
            tracing::warn!(
                job_id = upload.job_id,
                sample_id = upload.sample_id,
                reason = %rejection,
                "Rejected result upload",
            );
            return Err(rejection.into());
        }
    };

    if upload.success {
        state
            .storage
            .write_results(upload.sample_id, &upload.artifacts)
            .await
            .map_err(AppError::storage)?;
    }

    let error_message = if upload.success {
        None
    } else {
        Some(
            upload
                .error_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("Runner reported failure"),
        )
    };
    JobRepo::record_outcome(&mut *tx, &locked, upload.success, error_message).await?;
    tx.commit().await?;

    tracing::info!(
        job_id = upload.job_id,
        sample_id = upload.sample_id,
        success = upload.success,
        runner_hostname = upload.runner_hostname.as_deref().unwrap_or(""),
        "Recorded job result",
    );
    Ok(())
}
