//! Outbound alert adapters.
//!
//! - `ResendUploadAlert` - e-mail via the Resend HTTP API
//! - `LogUploadAlert` - log line only, when e-mail is not configured

mod log_only;
mod resend;

pub use log_only::LogUploadAlert;
pub use resend::{ResendConfig, ResendUploadAlert};
