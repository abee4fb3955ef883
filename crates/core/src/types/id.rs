//! Prefixed string IDs for type-safe entity references.
//!
//! Every document in the store is referenced by a string ID of the form
//! `<prefix>_<32 hex chars>` (e.g. `prd_9f0c...`). Use the `define_id!` macro
//! to create wrappers that prevent accidentally mixing IDs from different
//! entity types.

/// Macro to define a type-safe, prefixed string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `generate()` for fresh IDs, `new()` for existing values, `as_str()`
/// - `From<String>`, `From<&str>`, `AsRef<str>` and `PartialEq<str>`
///
/// # Example
///
/// ```rust
/// # use hembit_core::define_id;
/// define_id!(WidgetId, "wdg");
///
/// let id = WidgetId::generate();
/// assert!(id.as_str().starts_with("wdg_"));
/// assert_eq!(WidgetId::new("wdg_1"), *"wdg_1");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for freshly generated IDs.
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with this type's prefix.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!(
                    "{}_{}",
                    Self::PREFIX,
                    ::uuid::Uuid::new_v4().simple()
                ))
            }

            /// Wrap an existing ID value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId, "usr");
define_id!(AddressId, "addr");
define_id!(ProductId, "prd");
define_id!(CategoryId, "cat");
define_id!(SeriesId, "ser");
define_id!(SlideId, "slide");
define_id!(PostId, "blog");
define_id!(OrderId, "ord");
define_id!(PaymentId, "pay");
define_id!(SubscriberId, "nws");
define_id!(MailLogId, "mail");
define_id!(OtpId, "otp");
define_id!(MediaId, "media");
