//! Homepage and editorial content: slides, static pages, posts and settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hembit_core::{PostId, ProductId, SlideId, SlideKind};

use super::lenient;

/// Fallback support address when settings are blank.
pub const DEFAULT_SUPPORT_EMAIL: &str = "support@hembit.in";
/// Fallback contact number when settings are blank.
pub const DEFAULT_CONTACT_NUMBER: &str = "+91 00000 00000";
/// Fallback contact hours when settings are blank.
pub const DEFAULT_CONTACT_HOURS: &str = "Mon-Sat 9AM-7PM IST";

/// A homepage hero slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(rename = "type")]
    pub kind: SlideKind,
    pub url: String,
    #[serde(default)]
    pub cta_label: String,
    #[serde(default)]
    pub cta_link: String,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub order: i64,
    /// Products shown by a [`SlideKind::Products`] slide.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<ProductId>,
}

/// An editable static page (about, privacy, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContentPage {
    pub title: String,
    pub body: String,
}

/// An "HB Productions" editorial post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image: String,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub service_contact: ServiceContact,
}

/// Customer-service contact details shown in the footer and services page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceContact {
    pub support_email: String,
    pub contact_number: String,
    pub contact_hours: String,
}

impl ServiceContact {
    /// Replace blank fields with the storefront defaults.
    pub fn fill_defaults(&mut self) {
        fill(&mut self.support_email, DEFAULT_SUPPORT_EMAIL);
        fill(&mut self.contact_number, DEFAULT_CONTACT_NUMBER);
        fill(&mut self.contact_hours, DEFAULT_CONTACT_HOURS);
    }
}

fn fill(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        default.clone_into(field);
    }
}
