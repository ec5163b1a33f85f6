//! Authentication test helpers
//!
//! Provides utilities for creating test users and generating tokens.

use sqlx::PgPool;
use uuid::Uuid;

use ripple::backend::auth::sessions::create_token;
use ripple::backend::auth::users::create_user;

/// Test user credentials
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Create a test user in the database
pub async fn create_test_user(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<TestUser, Box<dyn std::error::Error>> {
    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let email = format!("{username}@example.com");

    let user = create_user(pool, username.to_string(), email, password_hash).await?;
    let token = create_token(user.id, &user.username).expect("Failed to create test token");

    Ok(TestUser {
        id: user.id,
        username: user.username,
        token,
    })
}

/// Create a test user with a unique username
pub async fn create_unique_test_user(
    pool: &PgPool,
) -> Result<TestUser, Box<dyn std::error::Error>> {
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("user_{}", &suffix[..12]);
    create_test_user(pool, &username, "test_password_123").await
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
