//! Status and classification enums for various entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shopper account created through signup.
    #[default]
    Customer,
    /// Back-office account with access to `/api/admin`.
    Admin,
}

impl UserRole {
    /// Returns the role as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// What a one-time password was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

/// Recipient group for admin mail-outs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MailAudience {
    /// Every registered account.
    Users,
    /// Every newsletter subscriber.
    Subscribers,
    /// Union of users and subscribers.
    #[default]
    Both,
}

impl FromStr for MailAudience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Self::Users),
            "subscribers" => Ok(Self::Subscribers),
            "both" => Ok(Self::Both),
            _ => Err(format!("invalid audience: {s}")),
        }
    }
}

impl fmt::Display for MailAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Users => f.write_str("users"),
            Self::Subscribers => f.write_str("subscribers"),
            Self::Both => f.write_str("both"),
        }
    }
}

/// Editable static pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKey {
    About,
    Founder,
    Privacy,
    Terms,
    Services,
}

impl ContentKey {
    /// Every editable page, in menu order.
    pub const ALL: [Self; 5] = [
        Self::About,
        Self::Founder,
        Self::Privacy,
        Self::Terms,
        Self::Services,
    ];

    /// Returns the key as used in URLs and the stored document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::About => "about",
            Self::Founder => "founder",
            Self::Privacy => "privacy",
            Self::Terms => "terms",
            Self::Services => "services",
        }
    }
}

impl FromStr for ContentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("invalid content key: {s}"))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Homepage hero slide media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Image,
    Video,
    /// A carousel of catalog products listed by ID.
    Products,
}

impl FromStr for SlideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "products" => Ok(Self::Products),
            _ => Err(format!("invalid slide type: {s}")),
        }
    }
}

/// Order fulfilment status.
///
/// Statuses are free-form and set by admins; any status may follow any other.
/// The constructors below name the values the checkout flow itself writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Wrap an arbitrary status label.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Status of a freshly created order awaiting payment.
    #[must_use]
    pub fn pending_confirmation() -> Self {
        Self::new("Pending Confirmation")
    }

    /// Status after payment has been confirmed.
    #[must_use]
    pub fn confirmed() -> Self {
        Self::new("Confirmed")
    }

    /// Terminal status; every other status counts as pending on the dashboard.
    #[must_use]
    pub fn delivered() -> Self {
        Self::new("Delivered")
    }

    /// Returns the status label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the order has reached the customer.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.0 == "Delivered"
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
