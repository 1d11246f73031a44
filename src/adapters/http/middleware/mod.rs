//! HTTP middleware for axum.
//!
//! - `auth` - Authentication middleware and extractor

pub mod auth;

pub use auth::{
    auth_error_response, auth_middleware, bearer_token, AuthRejection, AuthState, RequireAuth,
};
