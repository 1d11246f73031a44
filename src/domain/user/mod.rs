//! Chat users as seen by the conversation service.
//!
//! Users are provisioned by the surrounding marketplace; this service only
//! reads their role and verification status from the user directory.

mod chat_user;
mod role;

pub use chat_user::ChatUser;
pub use role::Role;
