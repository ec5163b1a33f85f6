//! Authentication Handlers
//!
//! HTTP handlers for signup, login, and the current-user endpoints.

pub mod login;
pub mod me;
pub mod signup;
pub mod types;

pub use login::login;
pub use me::{get_me, update_me, update_my_push_token};
pub use signup::signup;
