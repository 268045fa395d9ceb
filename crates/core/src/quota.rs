//! Submission quota gate.
//!
//! Pure decision logic: the database layer loads the user and settings rows
//! under a lock, asks [`check_submission`] whether the submission may
//! proceed, and only then decrements the counters.

use crate::types::Timestamp;

/// Counters relevant to a single submission attempt.
#[derive(Debug, Clone, Copy)]
pub struct QuotaState {
    /// Remaining submissions for the user.
    pub user_quota: i32,
    /// Remaining submissions across all users.
    pub global_quota: i32,
    /// Minimum minutes between two submissions by the same user.
    pub interval_mins: i32,
    /// When the user last submitted, `None` if never.
    pub last_submission_at: Option<Timestamp>,
}

/// Reason a submission was refused. The `Display` text is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaRejection {
    #[error("Unknown email address {0}.")]
    UnknownUser(String),

    #[error("You have reached your sample submission quota.")]
    UserQuotaExhausted,

    #[error("The global sample submission quota has been reached. Please try again later.")]
    GlobalQuotaExhausted,

    #[error("Your next sample submission is available in {wait_mins} minute{}.", plural(.wait_mins))]
    TooSoon { wait_mins: i64 },
}

fn plural(count: &i64) -> &'static str {
    if *count > 1 {
        "s"
    } else {
        ""
    }
}

/// Decide whether a submission may be accepted at `now`.
///
/// Checks run in order: user quota, global quota, submission interval.
/// Elapsed time is counted in whole minutes, truncating.
pub fn check_submission(state: &QuotaState, now: Timestamp) -> Result<(), QuotaRejection> {
    if state.user_quota <= 0 {
        return Err(QuotaRejection::UserQuotaExhausted);
    }
    if state.global_quota <= 0 {
        return Err(QuotaRejection::GlobalQuotaExhausted);
    }
    if let Some(last) = state.last_submission_at {
        let mins_since_last = (now - last).num_minutes();
        let wait_mins = i64::from(state.interval_mins) - mins_since_last;
        if wait_mins > 0 {
            return Err(QuotaRejection::TooSoon { wait_mins });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn state() -> QuotaState {
        QuotaState {
            user_quota: 3,
            global_quota: 100,
            interval_mins: 10,
            last_submission_at: None,
        }
    }

    #[test]
    fn first_submission_is_accepted() {
        assert_eq!(check_submission(&state(), Utc::now()), Ok(()));
    }

    #[test]
    fn exhausted_user_quota_is_rejected() {
        let s = QuotaState {
            user_quota: 0,
            ..state()
        };
        assert_eq!(
            check_submission(&s, Utc::now()),
            Err(QuotaRejection::UserQuotaExhausted)
        );
    }

    #[test]
    fn exhausted_global_quota_is_rejected() {
        let s = QuotaState {
            global_quota: 0,
            ..state()
        };
        assert_eq!(
            check_submission(&s, Utc::now()),
            Err(QuotaRejection::GlobalQuotaExhausted)
        );
    }

    #[test]
    fn user_quota_is_checked_before_global_quota() {
        let s = QuotaState {
            user_quota: 0,
            global_quota: 0,
            ..state()
        };
        assert_eq!(
            check_submission(&s, Utc::now()),
            Err(QuotaRejection::UserQuotaExhausted)
        );
    }

    #[test]
    fn submission_inside_interval_reports_wait_time() {
        let now = Utc::now();
        let s = QuotaState {
            last_submission_at: Some(now - Duration::minutes(4)),
            ..state()
        };
        let err = check_submission(&s, now).unwrap_err();
        assert_eq!(err, QuotaRejection::TooSoon { wait_mins: 6 });
        assert_eq!(
            err.to_string(),
            "Your next sample submission is available in 6 minutes."
        );
    }

    #[test]
    fn single_minute_wait_is_singular() {
        let now = Utc::now();
        let s = QuotaState {
            last_submission_at: Some(now - Duration::minutes(9)),
            ..state()
        };
        assert_eq!(
            check_submission(&s, now).unwrap_err().to_string(),
            "Your next sample submission is available in 1 minute."
        );
    }

    #[test]
    fn submission_after_interval_is_accepted() {
        let now = Utc::now();
        let s = QuotaState {
            last_submission_at: Some(now - Duration::minutes(10)),
            ..state()
        };
        assert_eq!(check_submission(&s, now), Ok(()));
    }

    #[test]
    fn zero_interval_never_blocks() {
        let now = Utc::now();
        let s = QuotaState {
            interval_mins: 0,
            last_submission_at: Some(now),
            ..state()
        };
        assert_eq!(check_submission(&s, now), Ok(()));
    }
}
