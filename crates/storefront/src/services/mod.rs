//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Accounts: signup and password-reset OTP flows, sign-in, JWTs
//! - `email` - Transactional and bulk email via Brevo
//! - `mailing` - Bulk sends with per-recipient failure reporting
//! - `media` - Base64 data-URL uploads written to the uploads directory

pub mod auth;
pub mod email;
pub mod mailing;
pub mod media;
