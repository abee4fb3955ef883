//! Orders placed through checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hembit_core::{Email, OrderId, OrderStatus, PaymentId, PaymentStatus, ProductId, UserId};

use super::{PostalAddress, lenient};

/// Size recorded when a cart line does not specify one.
pub const DEFAULT_SIZE: &str = "M";

/// A customer order with its status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer: OrderCustomer,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<PostalAddress>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal_or_zero"
    )]
    pub total: Decimal,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
    pub status: OrderStatus,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Set a new status, stamp `updatedAt` and append it to the timeline.
    pub fn transition(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.timeline.push(TimelineEntry::new(status.as_str(), at));
        self.status = status;
        self.updated_at = at;
    }

    /// Whether `email` is the order's contact address (case-insensitive).
    #[must_use]
    pub fn placed_by_email(&self, email: &str) -> bool {
        self.customer.email.matches(email)
    }
}

/// Name and address of the account that placed an order, copied at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: String,
    pub email: Email,
}

/// A priced order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub quantity: u32,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal_or_zero"
    )]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal_or_zero"
    )]
    pub line_total: Decimal,
}

/// One entry in an order's status history.
///
/// Labels are free text; besides order statuses the checkout flow records
/// events such as `Order Created` and `Payment Successful`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub status: String,
    pub at: DateTime<Utc>,
}

impl TimelineEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(status: &str, at: DateTime<Utc>) -> Self {
        Self {
            status: status.to_owned(),
            at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: UserId::new("usr_1"),
            customer: OrderCustomer {
                name: "Asha".into(),
                email: Email::parse("Asha@Example.com").unwrap(),
            },
            items: Vec::new(),
            address: None,
            total: Decimal::ZERO,
            payment_method: "razorpay".into(),
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            status: OrderStatus::pending_confirmation(),
            timeline: vec![TimelineEntry::new("Order Created", now)],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transition_appends_timeline() {
        let mut order = order();
        let later = order.created_at + chrono::Duration::minutes(5);
        order.transition(OrderStatus::new("Shipped"), later);

        assert_eq!(order.status.as_str(), "Shipped");
        assert_eq!(order.updated_at, later);
        assert_eq!(order.timeline.len(), 2);
        assert_eq!(order.timeline.last().unwrap().status, "Shipped");
    }

    #[test]
    fn test_placed_by_email_is_case_insensitive() {
        let order = order();
        assert!(order.placed_by_email("asha@example.com"));
        assert!(!order.placed_by_email("ravi@example.com"));
    }
}
