//! Auth Flow
//! Login, registration and token introspection over a user store and token service

use crate::auth::{
    jwt::TokenService,
    models::{
        LoginRequest, LoginResponse, NewUser, RegisterRequest, RegisterResponse, UserRole,
    },
    password::{looks_hashed, PasswordHasher},
    user_store::{DuplicateKey, UserStore},
};
use crate::error::AuthError;
use crate::models::is_valid_email;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Unknown user and wrong password both fail with `InvalidCredentials`
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let username = request.username.trim();

        let Some(user) = self.users.find_by_username(username)? else {
            warn!(username, "❌ Login attempt for non-existent user");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.password_matches(&request.password, &user.password, &user.username) {
            warn!(username, "❌ Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(username, "❌ Login attempt for deactivated user");
            return Err(AuthError::AccountInactive);
        }

        let token = self.tokens.mint(&user.username, user.role)?;

        if let Err(e) = self.users.update_last_login(user.id) {
            warn!(username, "Failed to record last login: {:#}", e);
        }

        info!(
            username,
            role = user.role.as_str(),
            "✅ Login successful"
        );

        Ok(LoginResponse {
            token,
            username: user.username,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            user_id: user.id,
            message: "Login successful".to_string(),
        })
    }

    /// Legacy accounts may still hold a plaintext credential
    fn password_matches(&self, candidate: &str, stored: &str, username: &str) -> bool {
        if looks_hashed(stored) {
            return match self.hasher.verify(candidate, stored) {
                Ok(matches) => matches,
                Err(e) => {
                    warn!(username, "Stored password hash is unreadable: {:#}", e);
                    false
                }
            };
        }

        let matches = !stored.is_empty() && stored == candidate;
        if matches {
            info!(
                username,
                "User logged in with plain password - will hash on next update"
            );
        }
        matches
    }

    /// New accounts are always active CUSTOMERs
    pub fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, AuthError> {
        let username = request.username.trim();
        let email = request.email.trim();
        validate_registration(username, email, &request.password)?;

        if self.users.find_by_username(username)?.is_some() {
            warn!(username, "Registration attempt with existing username");
            return Err(AuthError::DuplicateUser("Username already exists".to_string()));
        }

        if self.users.find_by_email(email)?.is_some() {
            warn!(email, "Registration attempt with existing email");
            return Err(AuthError::DuplicateUser("Email already exists".to_string()));
        }

        let inserted = self.users.insert(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: self.hasher.hash(&request.password)?,
            role: UserRole::Customer,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone: request.phone.clone(),
        });

        // A concurrent registration can take the key between lookup and insert
        let created = match inserted {
            Ok(user) => user,
            Err(e) if e.is::<DuplicateKey>() => {
                warn!(username, "Registration lost a race for username or email");
                let message = if self.users.find_by_username(username)?.is_some() {
                    "Username already exists"
                } else {
                    "Email already exists"
                };
                return Err(AuthError::DuplicateUser(message.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(username, "👤 User registered with role CUSTOMER");

        Ok(RegisterResponse {
            success: true,
            message: "Registration successful. Please login with your credentials.".to_string(),
            user_id: created.id,
            username: created.username,
            role: created.role,
        })
    }

    pub fn validate_token(&self, token: &str, expected_username: &str) -> bool {
        self.tokens.verify(token, expected_username)
    }

    pub fn username_from_token(&self, token: &str) -> Option<String> {
        self.tokens.claims(token).ok().map(|c| c.sub)
    }

    pub fn role_from_token(&self, token: &str) -> Option<UserRole> {
        self.tokens.claims(token).ok().map(|c| c.role)
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    let length = username.chars().count();
    if !(3..=50).contains(&length) {
        return Err(AuthError::ValidationFailed(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(AuthError::ValidationFailed("Invalid email format".to_string()));
    }
    if password.chars().count() < 6 {
        return Err(AuthError::ValidationFailed(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use crate::auth::password::BcryptHasher;
    use anyhow::Result;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MockUserStore {
        users: Mutex<Vec<User>>,
        inserts: Mutex<usize>,
        last_logins: Mutex<Vec<i64>>,
        /// Stored just before the next insert, which then fails like a lost race
        competing_signup: Mutex<Option<User>>,
    }

    impl MockUserStore {
        fn with_user(self, username: &str, password: &str, role: UserRole, active: bool) -> Self {
            let id = self.users.lock().len() as i64 + 1;
            self.users.lock().push(User {
                id,
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: password.to_string(),
                role,
                first_name: Some("First".to_string()),
                last_name: Some("Last".to_string()),
                phone: None,
                is_active: active,
                created_at: Utc::now(),
                last_login: None,
            });
            self
        }
    }

    impl UserStore for MockUserStore {
        fn find_by_username(&self, username: &str) -> Result<Option<User>> {
            Ok(self.users.lock().iter().find(|u| u.username == username).cloned())
        }

        fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
        }

        fn insert(&self, user: NewUser) -> Result<User> {
            *self.inserts.lock() += 1;
            let mut users = self.users.lock();
            if let Some(winner) = self.competing_signup.lock().take() {
                users.push(winner);
                return Err(DuplicateKey.into());
            }
            let stored = User {
                id: users.len() as i64 + 1,
                username: user.username,
                email: user.email,
                password: user.password_hash,
                role: user.role,
                first_name: user.first_name,
                last_name: user.last_name,
                phone: user.phone,
                is_active: true,
                created_at: Utc::now(),
                last_login: None,
            };
            users.push(stored.clone());
            Ok(stored)
        }

        fn update_last_login(&self, user_id: i64) -> Result<()> {
            self.last_logins.lock().push(user_id);
            Ok(())
        }
    }

    fn hasher() -> Arc<BcryptHasher> {
        Arc::new(BcryptHasher::with_cost(4))
    }

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            "service-test-secret".to_string(),
            Duration::from_secs(3600),
        ))
    }

    fn service(store: Arc<MockUserStore>) -> AuthService {
        AuthService::new(store, hasher(), tokens())
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            first_name: Some("New".to_string()),
            last_name: None,
            phone: None,
        }
    }

    #[test]
    fn test_login_with_hashed_password() {
        let hash = hasher().hash("correct").unwrap();
        let store = Arc::new(MockUserStore::default().with_user(
            "alice",
            &hash,
            UserRole::Customer,
            true,
        ));
        let auth = service(store.clone());

        let response = auth.login(&login_request("alice", "correct")).unwrap();
        assert!(!response.token.is_empty());
        assert_eq!(response.username, "alice");
        assert_eq!(response.role, UserRole::Customer);
        assert_eq!(response.user_id, 1);
        assert_eq!(*store.last_logins.lock(), vec![1]);

        assert!(auth.validate_token(&response.token, "alice"));
        assert_eq!(auth.role_from_token(&response.token), Some(UserRole::Customer));
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        let hash = hasher().hash("correct").unwrap();
        let store = Arc::new(MockUserStore::default().with_user(
            "bob",
            &hash,
            UserRole::Customer,
            true,
        ));
        let auth = service(store);

        let wrong = auth.login(&login_request("bob", "wrong")).unwrap_err();
        let unknown = auth.login(&login_request("nobody", "wrong")).unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn test_legacy_plaintext_password() {
        let store = Arc::new(MockUserStore::default().with_user(
            "legacy",
            "plainpass",
            UserRole::Admin,
            true,
        ));
        let auth = service(store);

        let response = auth.login(&login_request("legacy", "plainpass")).unwrap();
        assert_eq!(response.role, UserRole::Admin);
        assert!(auth.login(&login_request("legacy", "other")).is_err());
    }

    #[test]
    fn test_inactive_account_rejected_after_password_check() {
        let store = Arc::new(MockUserStore::default().with_user(
            "carol",
            "pw1234",
            UserRole::Customer,
            false,
        ));
        let auth = service(store.clone());

        assert!(matches!(
            auth.login(&login_request("carol", "pw1234")),
            Err(AuthError::AccountInactive)
        ));
        assert!(matches!(
            auth.login(&login_request("carol", "bad")),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(store.last_logins.lock().is_empty());
    }

    #[test]
    fn test_register_creates_customer() {
        let store = Arc::new(MockUserStore::default());
        let auth = service(store.clone());

        let response = auth
            .register(&register_request("newbie", "newbie@example.com"))
            .unwrap();
        assert!(response.success);
        assert_eq!(response.role, UserRole::Customer);
        assert_eq!(*store.inserts.lock(), 1);

        let stored = store.find_by_username("newbie").unwrap().unwrap();
        assert!(looks_hashed(&stored.password));

        let login = auth.login(&login_request("newbie", "secret1")).unwrap();
        assert_eq!(login.user_id, response.user_id);
    }

    #[test]
    fn test_register_duplicates_never_insert() {
        let store = Arc::new(MockUserStore::default().with_user(
            "alice",
            "pw",
            UserRole::Customer,
            true,
        ));
        let auth = service(store.clone());

        let by_name = auth
            .register(&register_request("alice", "fresh@example.com"))
            .unwrap_err();
        assert_eq!(by_name.to_string(), "Username already exists");

        let by_email = auth
            .register(&register_request("alice2", "alice@example.com"))
            .unwrap_err();
        assert_eq!(by_email.to_string(), "Email already exists");

        assert_eq!(*store.inserts.lock(), 0);
    }

    #[test]
    fn test_register_race_reports_duplicate() {
        let store = Arc::new(MockUserStore::default());
        let winner = MockUserStore::default()
            .with_user("racer", "pw", UserRole::Customer, true)
            .users
            .into_inner()
            .remove(0);
        *store.competing_signup.lock() = Some(winner);
        let auth = service(store.clone());

        let err = auth
            .register(&register_request("racer", "racer2@example.com"))
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUser(_)));
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[test]
    fn test_register_validation() {
        let store = Arc::new(MockUserStore::default());
        let auth = service(store.clone());

        let short = auth.register(&register_request("ab", "ab@example.com"));
        assert!(matches!(short, Err(AuthError::ValidationFailed(_))));

        let bad_email = auth.register(&register_request("abc", "not-an-email"));
        assert!(matches!(bad_email, Err(AuthError::ValidationFailed(_))));

        let mut weak = register_request("abc", "abc@example.com");
        weak.password = "12345".to_string();
        assert!(matches!(auth.register(&weak), Err(AuthError::ValidationFailed(_))));

        assert_eq!(*store.inserts.lock(), 0);
    }

    #[test]
    fn test_token_introspection_collapses_failures() {
        let auth = service(Arc::new(MockUserStore::default()));

        assert!(!auth.validate_token("garbage", "alice"));
        assert_eq!(auth.username_from_token("garbage"), None);
        assert_eq!(auth.role_from_token("garbage"), None);
    }
}
