//! One-time passwords for signup and password reset.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use hembit_core::{OtpId, OtpPurpose, UserId, normalize_email};

use super::lenient;

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// A pending one-time password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub id: OtpId,
    pub email: String,
    #[serde(rename = "type")]
    pub purpose: OtpPurpose,
    pub otp: String,
    pub payload: OtpPayload,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpRequest {
    /// Issue a request valid for [`OTP_TTL_MINUTES`] from `now`.
    #[must_use]
    pub fn issue(
        email: &str,
        purpose: OtpPurpose,
        otp: String,
        payload: OtpPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OtpId::generate(),
            email: email.to_owned(),
            purpose,
            otp,
            payload,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            created_at: now,
        }
    }

    /// Whether this request was issued to `email` for `purpose`.
    #[must_use]
    pub fn is_for(&self, email: &str, purpose: OtpPurpose) -> bool {
        self.purpose == purpose && normalize_email(&self.email) == normalize_email(email)
    }

    /// Whether `code` redeems this request at `now`.
    #[must_use]
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.otp == code.trim() && self.expires_at > now
    }

    /// Whether the request can no longer be redeemed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data carried from the start of a flow to its verification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum OtpPayload {
    /// Pending account, created once the code is verified.
    Signup {
        name: String,
        email: String,
        password_hash: String,
    },
    /// Account whose password will be replaced.
    PasswordReset { user_id: UserId },
}
