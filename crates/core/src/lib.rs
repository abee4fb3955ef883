//! HEMBIT Core - Shared types library.
//!
//! This crate provides common types used across all HEMBIT components:
//! - `storefront` - The JSON API serving the shop, accounts, checkout and admin back office
//! - `cli` - Command-line tools for seeding, exporting and managing the document store
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for prefixed IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
