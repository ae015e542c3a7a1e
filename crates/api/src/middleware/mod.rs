//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Authentication (access policy, then bearer token)

pub mod auth;
pub mod policy;
pub mod request_id;

pub use auth::{CurrentMember, Principal, RequireAuth, authenticate};
pub use policy::{Access, AccessPolicy, PUBLIC_PATHS, PathPattern};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
