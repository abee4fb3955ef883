//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (add unique ID to each request)
//! 3. `TraceLayer` (request tracing)
//! 4. Security headers
//! 5. CORS
//! 6. Rate limiting (governor), per route group
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireAuth`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireAuth};
pub use rate_limit::{RateLimits, api_rate_limiter, auth_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
