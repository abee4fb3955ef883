//! Invariants re-applied to the document after every load and write.

use chrono::{DateTime, Utc};

use hembit_core::{ContentKey, Email, UserRole};

use crate::models::{ContentPage, Document, User};

/// The administrator account guaranteed to exist in every document.
///
/// The password is hashed once at startup so normalization stays cheap.
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Bring a document into its canonical shape.
///
/// - blank service-contact settings get the storefront defaults
/// - every editable content page exists
/// - expired OTP requests are dropped
/// - the admin account is re-created if no user has its email
pub fn normalize(doc: &mut Document, admin: &AdminSeed, now: DateTime<Utc>) {
    doc.settings.service_contact.fill_defaults();

    for key in ContentKey::ALL {
        doc.content
            .entry(key.as_str().to_owned())
            .or_insert_with(ContentPage::default);
    }

    doc.otp_requests.retain(|request| !request.is_expired(now));

    if doc.find_user_by_email(admin.email.as_str()).is_none() {
        tracing::info!(email = %admin.email, "seeding admin account");
        doc.users.push(User::new(
            admin.name.clone(),
            admin.email.clone(),
            admin.password_hash.clone(),
            UserRole::Admin,
        ));
    }
}
