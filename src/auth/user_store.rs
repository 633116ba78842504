//! User Storage
//! Credential lookups the auth flow needs; `Database` is the production backend

use crate::auth::models::{NewUser, User};
use anyhow::Result;
use thiserror::Error;

/// Returned (inside `anyhow::Error`) by `insert` when the username or email
/// is already taken at write time
#[derive(Debug, Error)]
#[error("username or email already taken")]
pub struct DuplicateKey;

/// Keyed user record store consumed by `AuthService`
pub trait UserStore: Send + Sync {
    /// Returns deactivated accounts too
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fails with `DuplicateKey` when a concurrent insert won the unique key
    fn insert(&self, user: NewUser) -> Result<User>;

    fn update_last_login(&self, user_id: i64) -> Result<()>;
}
