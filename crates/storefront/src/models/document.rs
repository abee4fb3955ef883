//! The root document holding every collection.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hembit_core::{CategoryId, MailAudience, OrderId, ProductId, SeriesId, UserId, normalize_email};

use super::{
    Category, ContentPage, MailLog, Order, OtpRequest, Post, Product, ProductView, Settings,
    Slide, Subscriber, User,
};

/// The entire persisted store.
///
/// Missing collections deserialize as empty so that partial seed files load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub slides: Vec<Slide>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub content: BTreeMap<String, ContentPage>,
    pub hb_productions: Vec<Post>,
    pub users: Vec<User>,
    pub otp_requests: Vec<OtpRequest>,
    pub orders: Vec<Order>,
    pub newsletter_subscribers: Vec<Subscriber>,
    pub mail_logs: Vec<MailLog>,
    pub settings: Settings,
    /// Top-level keys this server does not model, kept so rewrites do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    // =========================================================================
    // Users
    // =========================================================================

    /// Find a user by ID.
    #[must_use]
    pub fn find_user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Find a user by ID for mutation.
    pub fn find_user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| &u.id == id)
    }

    /// Find a user by email, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = normalize_email(email);
        self.users
            .iter()
            .find(|u| normalize_email(u.email.as_str()) == wanted)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Find a product by ID.
    #[must_use]
    pub fn find_product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Find a product whose slug or ID equals `key`.
    #[must_use]
    pub fn find_product_by_slug_or_id(&self, key: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.slug == key || p.id == *key)
    }

    /// Find a category by ID.
    #[must_use]
    pub fn find_category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Find a category whose slug or ID equals `key`.
    #[must_use]
    pub fn find_category_by_slug_or_id(&self, key: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.slug == key || c.id == *key)
    }

    /// Resolve a series slug to its ID, searching every category.
    #[must_use]
    pub fn series_id_for_slug(&self, slug: &str) -> Option<SeriesId> {
        self.categories
            .iter()
            .flat_map(|c| c.series.iter())
            .find(|s| s.slug == slug)
            .map(|s| s.id.clone())
    }

    /// Derive display views for a set of products.
    #[must_use]
    pub fn product_views<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<ProductView> {
        products
            .into_iter()
            .map(|p| ProductView::derive(self, p))
            .collect()
    }

    /// Slides ordered by their `order` field.
    #[must_use]
    pub fn sorted_slides(&self) -> Vec<Slide> {
        let mut slides = self.slides.clone();
        slides.sort_by_key(|s| s.order);
        slides
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Find an order by ID for mutation.
    pub fn find_order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| &o.id == id)
    }

    // =========================================================================
    // Mailing
    // =========================================================================

    /// Whether `email` is already subscribed (case-insensitive).
    #[must_use]
    pub fn is_subscribed(&self, email: &str) -> bool {
        let wanted = normalize_email(email);
        self.newsletter_subscribers
            .iter()
            .any(|s| normalize_email(&s.email) == wanted)
    }

    /// Deduplicated, lowercased recipient list for an audience.
    ///
    /// Users come before subscribers for [`MailAudience::Both`].
    #[must_use]
    pub fn audience_emails(&self, audience: MailAudience) -> Vec<String> {
        let users = self.users.iter().map(|u| u.email.as_str());
        let subscribers = self.newsletter_subscribers.iter().map(|s| s.email.as_str());

        match audience {
            MailAudience::Users => dedupe_emails(users),
            MailAudience::Subscribers => dedupe_emails(subscribers),
            MailAudience::Both => dedupe_emails(users.chain(subscribers)),
        }
    }
}

/// Trim, lowercase and deduplicate addresses, preserving first-seen order and
/// dropping blanks.
pub fn dedupe_emails<'a>(emails: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .map(normalize_email)
        .filter(|email| !email.is_empty() && seen.insert(email.clone()))
        .collect()
}
