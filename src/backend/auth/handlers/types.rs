//! Authentication Handler Types
//!
//! This module defines the request and response types used by authentication
//! handlers. These types are shared across signup, login, and get_me handlers.

use serde::{Deserialize, Serialize};

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    /// User's chosen username (3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// User's email address
    pub email: String,
    /// User's password (will be hashed before storage)
    pub password: String,
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    /// User's username (can also be email)
    pub username: String,
    /// User's password (will be verified against stored hash)
    pub password: String,
}

/// Auth response
///
/// Returned by signup and login handlers. Contains the JWT token
/// and user information for immediate authentication.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    /// JWT token for authentication (30-day expiration)
    pub token: String,
    /// User information (without sensitive data)
    pub user: UserResponse,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserResponse {
    /// User's unique ID (UUID)
    pub id: String,
    /// User's username
    pub username: String,
    /// User's email address
    pub email: String,
    /// Display name, if set
    pub display_name: Option<String>,
    /// Avatar URL, if set
    pub avatar_url: Option<String>,
}

impl From<crate::backend::auth::users::User> for UserResponse {
    fn from(user: crate::backend::auth::users::User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

/// Profile update request (PUT /api/users/me)
#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateProfileRequest {
    /// New display name; `null` clears it
    pub display_name: Option<String>,
    /// New avatar URL; `null` clears it
    pub avatar_url: Option<String>,
}

/// Push token registration request (PUT /api/users/me/push-token)
#[derive(Deserialize, Serialize, Debug)]
pub struct PushTokenRequest {
    /// Device push token; `null` unregisters the device
    pub push_token: Option<String>,
}
