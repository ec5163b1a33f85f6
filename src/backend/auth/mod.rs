//! Authentication Module
//!
//! JWT session tokens, user persistence, and the signup/login/me handlers.

pub mod handlers;
pub mod sessions;
pub mod users;

pub use handlers::{get_me, login, signup, update_me, update_my_push_token};
