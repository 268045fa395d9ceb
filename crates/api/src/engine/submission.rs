//! Sample submission: input validation, quota gate and file storage.

use axum::body::Bytes;
use chrono::Utc;
use predictcr_core::quota::{check_submission, QuotaState};
use predictcr_core::validation::{check_allowed, check_file_size, missing_csv_columns};
use predictcr_db::models::sample::{NewSample, Sample, SubmissionOutcome};
use predictcr_db::models::settings::Settings;
use predictcr_db::models::user::User;
use predictcr_db::repositories::{SampleRepo, SettingsRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::StagedInputs;

/// Fields of a `POST /samples` multipart upload.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub name: String,
    pub tumor_type: String,
    pub source: String,
    pub platform: String,
    pub h5_file: Option<Bytes>,
    pub csv_file: Option<Bytes>,
}

/// A form that passed validation.
struct ValidSubmission {
    sample: NewSample,
    h5: Bytes,
    csv: Bytes,
}

/// Check a form against the current settings.
fn validate(form: SubmissionForm, email: &str, settings: &Settings) -> Result<ValidSubmission, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Missing sample name".to_string());
    }
    check_allowed("tumor type", &form.tumor_type, &settings.tumor_types)?;
    check_allowed("source", &form.source, &settings.sources)?;
    check_allowed("platform", &form.platform, &settings.platforms)?;

    let h5 = form.h5_file.ok_or("Missing h5 file")?;
    let csv = form.csv_file.ok_or("Missing csv file")?;
    check_file_size("h5", h5.len(), settings.max_filesize_h5_mb)?;
    check_file_size("csv", csv.len(), settings.max_filesize_csv_mb)?;

    let missing = missing_csv_columns(&csv, &settings.csv_required_columns);
    if !missing.is_empty() {
        return Err(format!(
            "csv file is missing required column(s): {}",
            missing.join(", ")
        ));
    }

    Ok(ValidSubmission {
        sample: NewSample {
            email: email.to_string(),
            name: name.to_string(),
            tumor_type: form.tumor_type,
            source: form.source,
            platform: form.platform,
        },
        h5,
        csv,
    })
}

/// Validate and accept a new sample from `user`.
///
/// The inputs are staged on disk before the quota transaction starts. Inside
/// it, the quota gate locks the user and settings rows; the staged files are
/// then renamed into the sample directory and the transaction commits. If
/// the rename fails nothing is committed.
pub async fn submit_sample(state: &AppState, user: &User, form: SubmissionForm) -> AppResult<Sample> {
    let settings = SettingsRepo::get(&state.pool).await?;
    let valid = validate(form, &user.email, &settings).map_err(AppError::BadRequest)?;

    // Unlocked pre-check so refused submissions skip the file write. The
    // locked check in the transaction below is authoritative.
    let now = Utc::now();
    if let Err(reason) = check_submission(&quota_state(user, &settings), now) {
        tracing::info!(email = %user.email, reason = %reason, "Submission refused by quota gate");
        return Err(AppError::BadRequest(reason.to_string()));
    }

    let staged = state
        .storage
        .stage_inputs(&valid.h5, &valid.csv)
        .await
        .map_err(AppError::storage)?;
    let result = accept_staged(state, &valid.sample, &staged).await;
    if result.is_err() {
        state.storage.discard_staged(staged).await;
    }
    let sample = result?;

    tracing::info!(sample_id = sample.id, email = %user.email, name = %sample.name, "Sample submitted");
    Ok(sample)
}

fn quota_state(user: &User, settings: &Settings) -> QuotaState {
    QuotaState {
        user_quota: user.quota,
        global_quota: settings.global_quota,
        interval_mins: user.submission_interval_minutes,
        last_submission_at: user.last_submission_at,
    }
}

/// Run the quota transaction and move the staged inputs into place.
async fn accept_staged(
    state: &AppState,
    new_sample: &NewSample,
    staged: &StagedInputs,
) -> AppResult<Sample> {
    let mut tx = state.pool.begin().await?;
    let sample = match SampleRepo::create_with_quota(&mut *tx, new_sample, Utc::now()).await? {
        SubmissionOutcome::Accepted(sample) => sample,
        SubmissionOutcome::Rejected(reason) => {
            tracing::info!(email = %new_sample.email, reason = %reason, "Submission refused by quota gate");
            return Err(AppError::BadRequest(reason.to_string()));
        }
    };

    // The transaction rolls back on drop if the move fails.
    state
        .storage
        .commit_staged(staged, sample.id)
        .await
        .map_err(AppError::storage)?;
    if let Err(e) = tx.commit().await {
        if let Err(cleanup) = state.storage.delete_sample(sample.id).await {
            tracing::warn!(sample_id = sample.id, error = %cleanup, "Failed to remove uncommitted upload");
        }
        return Err(e.into());
    }
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            id: 1,
            default_personal_submission_quota: 10,
            default_personal_submission_interval_mins: 5,
            global_quota: 100,
            tumor_types: "Lung;Breast".to_string(),
            sources: String::new(),
            platforms: "10x".to_string(),
            csv_required_columns: "barcode;cdr3".to_string(),
            runner_job_timeout_mins: 60,
            max_filesize_h5_mb: 1,
            max_filesize_csv_mb: 1,
            about_md: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form() -> SubmissionForm {
        SubmissionForm {
            name: "sample one".to_string(),
            tumor_type: "Lung".to_string(),
            source: "anything".to_string(),
            platform: "10x".to_string(),
            h5_file: Some(Bytes::from_static(b"h5")),
            csv_file: Some(Bytes::from_static(b"barcode,cdr3\nA,B\n")),
        }
    }

    #[test]
    fn valid_form_is_accepted() {
        let valid = validate(form(), "a@example.com", &settings()).unwrap();
        assert_eq!(valid.sample.email, "a@example.com");
        assert_eq!(valid.sample.name, "sample one");
    }

    #[test]
    fn unknown_tumor_type_is_rejected() {
        let f = SubmissionForm {
            tumor_type: "Bone".to_string(),
            ..form()
        };
        let err = validate(f, "a@example.com", &settings()).err().unwrap();
        assert_eq!(err, "Invalid tumor type 'Bone'");
    }

    #[test]
    fn missing_files_are_rejected() {
        let f = SubmissionForm {
            csv_file: None,
            ..form()
        };
        assert_eq!(
            validate(f, "a@example.com", &settings()).err().unwrap(),
            "Missing csv file"
        );
    }

    #[test]
    fn oversized_h5_is_rejected() {
        let f = SubmissionForm {
            h5_file: Some(Bytes::from(vec![0u8; 2 * 1024 * 1024])),
            ..form()
        };
        assert!(validate(f, "a@example.com", &settings()).is_err());
    }

    #[test]
    fn missing_csv_columns_are_listed() {
        let f = SubmissionForm {
            csv_file: Some(Bytes::from_static(b"barcode,count\n")),
            ..form()
        };
        let err = validate(f, "a@example.com", &settings()).err().unwrap();
        assert!(err.ends_with("cdr3"), "{err}");
    }
}
