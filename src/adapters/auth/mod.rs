//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `zitadel` - JWT validation against a Zitadel JWKS
//! - `mock` - fixed tokens for tests

mod mock;
mod zitadel;

pub use mock::MockSessionValidator;
pub use zitadel::{ZitadelConfig, ZitadelSessionValidator};
