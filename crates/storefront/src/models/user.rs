//! User domain types.
//!
//! [`User`] is the stored record (including the password hash). The other
//! types are the projections handed out over the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hembit_core::{AddressId, Email, UserId, UserRole};

use super::lenient;

/// A registered account as stored in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default, deserialize_with = "lenient::optional_u32")]
    pub age: Option<u32>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub addresses: Vec<SavedAddress>,
}

impl User {
    /// Create a freshly verified account with an empty profile.
    #[must_use]
    pub fn new(name: String, email: Email, password_hash: String, role: UserRole) -> Self {
        Self {
            id: UserId::generate(),
            name,
            email,
            password_hash,
            mobile: String::new(),
            country: String::new(),
            pincode: String::new(),
            gender: String::new(),
            age: None,
            role,
            is_verified: true,
            created_at: Some(Utc::now()),
            addresses: Vec::new(),
        }
    }

    /// Whether this account may use the admin API.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// The minimal identity attached to authenticated requests.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// The full self-service profile (everything but the password hash).
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            mobile: self.mobile.clone(),
            country: self.country.clone(),
            pincode: self.pincode.clone(),
            gender: self.gender.clone(),
            age: self.age,
            addresses: self.addresses.clone(),
        }
    }

    /// Row shown in the admin user list.
    #[must_use]
    pub fn admin_view(&self) -> AdminUserView {
        AdminUserView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            country: self.country.clone(),
            pincode: self.pincode.clone(),
            gender: self.gender.clone(),
            age: self.age,
            role: self.role,
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }
}

/// Identity of the caller on authenticated routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
}

/// Self-service profile returned by `/api/auth/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub mobile: String,
    pub country: String,
    pub pincode: String,
    pub gender: String,
    pub age: Option<u32>,
    pub addresses: Vec<SavedAddress>,
}

/// User row for the admin back office.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub mobile: String,
    pub country: String,
    pub pincode: String,
    pub gender: String,
    pub age: Option<u32>,
    pub role: UserRole,
    pub is_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// A postal address, as entered at checkout or saved to an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostalAddress {
    #[serde(deserialize_with = "lenient::text")]
    pub line1: String,
    #[serde(deserialize_with = "lenient::text")]
    pub line2: String,
    #[serde(deserialize_with = "lenient::text")]
    pub city: String,
    #[serde(deserialize_with = "lenient::text")]
    pub state: String,
    #[serde(deserialize_with = "lenient::text")]
    pub postal_code: String,
    #[serde(deserialize_with = "lenient::text")]
    pub country: String,
}

impl PostalAddress {
    /// Every field except `line2` must be non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.line1,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// An address saved to a user's account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedAddress {
    pub id: AddressId,
    #[serde(flatten)]
    pub address: PostalAddress,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sparse_user_gets_profile_defaults() {
        let user: User = serde_json::from_value(json!({
            "id": "usr_1",
            "name": "Asha",
            "email": "asha@example.com",
            "passwordHash": "x",
            "age": "not a number"
        }))
        .unwrap();

        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.mobile, "");
        assert_eq!(user.age, None);
        assert!(user.addresses.is_empty());
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_saved_address_is_flat_on_the_wire() {
        let saved = SavedAddress {
            id: AddressId::new("addr_1"),
            address: PostalAddress {
                line1: "12 MG Road".into(),
                city: "Pune".into(),
                state: "MH".into(),
                postal_code: "411001".into(),
                country: "India".into(),
                ..PostalAddress::default()
            },
        };
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["id"], "addr_1");
        assert_eq!(value["postalCode"], "411001");
        assert_eq!(value["line2"], "");
    }

    #[test]
    fn test_address_completeness() {
        let mut address = PostalAddress {
            line1: "1".into(),
            city: "c".into(),
            state: "s".into(),
            postal_code: "p".into(),
            country: "IN".into(),
            ..PostalAddress::default()
        };
        assert!(address.is_complete());
        address.city = "  ".into();
        assert!(!address.is_complete());
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User::new(
            "Asha".into(),
            Email::parse("asha@example.com").unwrap(),
            "secret-hash".into(),
            UserRole::Customer,
        );
        let value = serde_json::to_value(user.profile()).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["role"], "customer");
    }
}
