//! Account contracts: profile documents, storage paths, and the mapping of
//! account-operation failures to user-facing messages.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{AccountId, Timestamp};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const MSG_ACCOUNT_EXISTS: &str = "An account with this email already exists.";
pub const MSG_PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred";

/// Failure codes that mean the credentials were wrong.
const INVALID_CREDENTIAL_CODES: &[&str] = &[
    "auth/invalid-credential",
    "auth/wrong-password",
    "auth/user-not-found",
];

const ACCOUNT_EXISTS_CODE: &str = "auth/email-already-in-use";

/// Map an account-operation failure to the message shown near the form.
///
/// Known codes get a friendly message; anything else surfaces its raw
/// message (or a generic fallback when that is empty).
pub fn user_message(code: &str, raw_message: &str) -> String {
    if INVALID_CREDENTIAL_CODES.contains(&code) {
        MSG_INVALID_CREDENTIALS.to_string()
    } else if code == ACCOUNT_EXISTS_CODE {
        MSG_ACCOUNT_EXISTS.to_string()
    } else if raw_message.trim().is_empty() {
        MSG_UNEXPECTED.to_string()
    } else {
        raw_message.to_string()
    }
}

/// Sign-up precondition checked before contacting the account service.
pub fn validate_sign_up(password: &str, confirm_password: &str) -> Result<(), CoreError> {
    if password != confirm_password {
        return Err(CoreError::Validation(MSG_PASSWORDS_DO_NOT_MATCH.into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Identity as reported by the account collaborator at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub id: AccountId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Per-account profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub id: AccountId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: Timestamp,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Storage paths
// ---------------------------------------------------------------------------

/// Root of every blob owned by an account.
pub fn account_prefix(account: &str) -> String {
    format!("user_uploads/{account}")
}

/// Fixed path of an account's profile photo.
pub fn profile_photo_path(account: &str) -> String {
    format!("{}/profile_photo.jpg", account_prefix(account))
}

/// Path for a planner slot image upload.
///
/// `suffix` is a short random token so two uploads in the same millisecond
/// do not collide.
pub fn planner_upload_path(account: &str, timestamp_ms: i64, suffix: &str, extension: &str) -> String {
    format!(
        "{}/{timestamp_ms}_{suffix}.{extension}",
        account_prefix(account)
    )
}

/// Validate an opaque account id before it is used in storage paths.
pub fn validate_account_id(account: &str) -> Result<(), CoreError> {
    if account.is_empty() || account.len() > 128 {
        return Err(CoreError::Validation(
            "Account id must be between 1 and 128 characters".into(),
        ));
    }
    if !account
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Account id may only contain alphanumeric, hyphen, or underscore characters".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_codes_map_to_friendly_message() {
        for code in INVALID_CREDENTIAL_CODES {
            assert_eq!(user_message(code, "Firebase: error"), MSG_INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn existing_account_code_maps_to_friendly_message() {
        assert_eq!(
            user_message("auth/email-already-in-use", "raw"),
            MSG_ACCOUNT_EXISTS
        );
    }

    #[test]
    fn unknown_codes_surface_raw_message() {
        assert_eq!(user_message("auth/network-request-failed", "Network down"), "Network down");
        assert_eq!(user_message("weird", ""), MSG_UNEXPECTED);
    }

    #[test]
    fn sign_up_requires_matching_passwords() {
        assert!(validate_sign_up("hunter22", "hunter22").is_ok());
        let err = validate_sign_up("a", "b").unwrap_err();
        assert!(err.to_string().contains(MSG_PASSWORDS_DO_NOT_MATCH));
    }

    #[test]
    fn paths_are_namespaced_per_account() {
        assert_eq!(profile_photo_path("u1"), "user_uploads/u1/profile_photo.jpg");
        assert_eq!(
            planner_upload_path("u1", 1700000000000, "abc123xyz", "png"),
            "user_uploads/u1/1700000000000_abc123xyz.png"
        );
    }

    #[test]
    fn account_id_validation() {
        assert!(validate_account_id("uid_123-x").is_ok());
        assert!(validate_account_id("").is_err());
        assert!(validate_account_id("../etc").is_err());
    }
}
