//! Global settings singleton.

use predictcr_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single row of the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Settings {
    pub id: i16,
    pub default_personal_submission_quota: i32,
    pub default_personal_submission_interval_mins: i32,
    pub global_quota: i32,
    /// `;`-separated list of accepted tumor types.
    pub tumor_types: String,
    /// `;`-separated list of accepted sample sources.
    pub sources: String,
    /// `;`-separated list of accepted sequencing platforms.
    pub platforms: String,
    /// `;`-separated list of columns every input CSV must contain.
    pub csv_required_columns: String,
    /// Minutes after which a running sample is put back in the queue.
    pub runner_job_timeout_mins: i32,
    pub max_filesize_h5_mb: i32,
    pub max_filesize_csv_mb: i32,
    pub about_md: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Partial settings update. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettings {
    pub default_personal_submission_quota: Option<i32>,
    pub default_personal_submission_interval_mins: Option<i32>,
    pub global_quota: Option<i32>,
    pub tumor_types: Option<String>,
    pub sources: Option<String>,
    pub platforms: Option<String>,
    pub csv_required_columns: Option<String>,
    pub runner_job_timeout_mins: Option<i32>,
    pub max_filesize_h5_mb: Option<i32>,
    pub max_filesize_csv_mb: Option<i32>,
    pub about_md: Option<String>,
}

impl UpdateSettings {
    /// Check numeric fields are in range. Returns a human-readable message.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("default_personal_submission_quota", self.default_personal_submission_quota),
            (
                "default_personal_submission_interval_mins",
                self.default_personal_submission_interval_mins,
            ),
            ("global_quota", self.global_quota),
            ("max_filesize_h5_mb", self.max_filesize_h5_mb),
            ("max_filesize_csv_mb", self.max_filesize_csv_mb),
        ];
        for (key, value) in non_negative {
            if matches!(value, Some(v) if v < 0) {
                return Err(format!("{key} must not be negative"));
            }
        }
        if matches!(self.runner_job_timeout_mins, Some(v) if v <= 0) {
            return Err("runner_job_timeout_mins must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<UpdateSettings, _> =
            serde_json::from_value(serde_json::json!({ "not_a_setting": 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn negative_quota_is_invalid() {
        let update = UpdateSettings {
            global_quota: Some(-1),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err(), "global_quota must not be negative");
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let update = UpdateSettings {
            runner_job_timeout_mins: Some(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateSettings::default().validate().is_ok());
    }
}
