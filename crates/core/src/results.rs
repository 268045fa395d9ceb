//! Result artifact tiers.
//!
//! Every successful job uploads three archives. Which one a caller may
//! download depends on who they are: admins see the full admin archive,
//! trusted users (`full_results`) the extended one, owners the basic one.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTier {
    User,
    TrustedUser,
    Admin,
}

impl ResultTier {
    /// Every tier, in upload order.
    pub const ALL: [ResultTier; 3] = [
        ResultTier::User,
        ResultTier::TrustedUser,
        ResultTier::Admin,
    ];

    /// Multipart field name used by runners when uploading this tier.
    pub fn field_name(self) -> &'static str {
        match self {
            ResultTier::User => "user_results",
            ResultTier::TrustedUser => "trusted_user_results",
            ResultTier::Admin => "admin_results",
        }
    }

    /// File name the archive is stored under, and the name the analysis
    /// script must produce.
    pub fn file_name(self) -> &'static str {
        match self {
            ResultTier::User => "user_results.zip",
            ResultTier::TrustedUser => "trusted_user_results.zip",
            ResultTier::Admin => "admin_results.zip",
        }
    }

    /// Look up a tier by its multipart field name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.field_name() == name)
    }

    /// The tier visible to a caller with the given flags.
    pub fn for_viewer(is_admin: bool, full_results: bool) -> Self {
        if is_admin {
            ResultTier::Admin
        } else if full_results {
            ResultTier::TrustedUser
        } else {
            ResultTier::User
        }
    }
}
