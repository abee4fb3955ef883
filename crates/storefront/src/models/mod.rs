//! Domain models for the storefront document.
//!
//! The whole store is one JSON document ([`Document`]) whose top-level keys are
//! the collections below. Relationships are plain string IDs resolved with
//! linear scans at read time; nothing here enforces referential integrity.

pub mod catalog;
pub mod content;
pub mod document;
pub mod lenient;
pub mod newsletter;
pub mod order;
pub mod otp;
pub mod user;

pub use catalog::{Category, Product, ProductView, Series};
pub use content::{ContentPage, Post, ServiceContact, Settings, Slide};
pub use document::Document;
pub use newsletter::{MailLog, Subscriber};
pub use order::{Order, OrderCustomer, OrderItem, TimelineEntry};
pub use otp::{OtpPayload, OtpRequest};
pub use user::{AccountSummary, AdminUserView, PostalAddress, Profile, SavedAddress, User};
