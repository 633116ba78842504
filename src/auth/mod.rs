//! Authentication Module
//! JWT bearer tokens, bcrypt credentials and a central access policy

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod service;
pub mod user_store;

pub use jwt::TokenService;
pub use middleware::{auth_middleware, AuthGuard};
pub use password::{BcryptHasher, PasswordHasher};
pub use policy::{Access, AccessPolicy};
pub use service::AuthService;
pub use user_store::UserStore;
