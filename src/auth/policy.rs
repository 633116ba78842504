//! Authorization Policy
//! Ordered table of path patterns and the access each requires; first match wins

use crate::auth::models::{Claims, UserRole};
use crate::error::AuthError;
use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(UserRole),
}

#[derive(Debug, Clone)]
struct Rule {
    /// Empty matches every method
    methods: Vec<Method>,
    pattern: String,
    access: Access,
}

impl Rule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        (self.methods.is_empty() || self.methods.contains(method))
            && pattern_matches(&self.pattern, path)
    }
}

/// `/api/hotels/**` matches `/api/hotels` and everything below it; other patterns match exactly.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/**") {
        Some(prefix) => {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => path == pattern,
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<Rule>,
    fallback: Access,
}

impl AccessPolicy {
    /// Empty policy; unmatched routes require authentication
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Access::Authenticated,
        }
    }

    pub fn rule(mut self, methods: &[Method], pattern: &str, access: Access) -> Self {
        self.rules.push(Rule {
            methods: methods.to_vec(),
            pattern: pattern.to_string(),
            access,
        });
        self
    }

    /// Route table for the booking API
    pub fn default_table() -> Self {
        let writes = [Method::POST, Method::PUT, Method::DELETE];
        let admin = Access::Role(UserRole::Admin);

        Self::new()
            .rule(&[], "/health", Access::Public)
            .rule(&[], "/api/auth/**", Access::Public)
            .rule(&[Method::GET], "/api/hotels/**", Access::Public)
            .rule(&[Method::GET], "/api/rooms/**", Access::Public)
            .rule(&[], "/api/users/**", admin)
            .rule(&writes, "/api/hotels/**", admin)
            .rule(&writes, "/api/rooms/**", admin)
            .rule(&[], "/api/dashboard/**", Access::Authenticated)
            .rule(&[], "/api/bookings/**", Access::Authenticated)
            .rule(&[], "/api/customers/**", Access::Authenticated)
    }

    pub fn access_for(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.access)
            .unwrap_or(self.fallback)
    }

    /// Single evaluation point for every request
    pub fn guard(
        &self,
        method: &Method,
        path: &str,
        claims: Option<&Claims>,
    ) -> Result<(), AuthError> {
        match (self.access_for(method, path), claims) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(AuthError::MissingToken),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Role(required), Some(claims)) if claims.role == required => Ok(()),
            (Access::Role(_), Some(_)) => Err(AuthError::Forbidden),
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::default_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: UserRole) -> Claims {
        Claims {
            sub: "someone".to_string(),
            role,
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[test]
    fn test_pattern_matching() {
        assert!(pattern_matches("/api/hotels/**", "/api/hotels"));
        assert!(pattern_matches("/api/hotels/**", "/api/hotels/7"));
        assert!(!pattern_matches("/api/hotels/**", "/api/hotelsx"));
        assert!(pattern_matches("/health", "/health"));
        assert!(!pattern_matches("/health", "/health/deep"));
    }

    #[test]
    fn test_public_routes() {
        let policy = AccessPolicy::default_table();

        assert!(policy.guard(&Method::GET, "/health", None).is_ok());
        assert!(policy.guard(&Method::POST, "/api/auth/login", None).is_ok());
        assert!(policy.guard(&Method::GET, "/api/hotels", None).is_ok());
        assert!(policy.guard(&Method::GET, "/api/rooms/available", None).is_ok());
    }

    #[test]
    fn test_catalogue_writes_need_admin() {
        let policy = AccessPolicy::default_table();
        let customer = claims(UserRole::Customer);
        let admin = claims(UserRole::Admin);

        assert!(matches!(
            policy.guard(&Method::POST, "/api/hotels", None),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            policy.guard(&Method::DELETE, "/api/rooms/3", Some(&customer)),
            Err(AuthError::Forbidden)
        ));
        assert!(policy.guard(&Method::PUT, "/api/hotels/1", Some(&admin)).is_ok());
    }

    #[test]
    fn test_users_admin_only_for_every_method() {
        let policy = AccessPolicy::default_table();

        assert!(matches!(
            policy.guard(&Method::GET, "/api/users", Some(&claims(UserRole::Customer))),
            Err(AuthError::Forbidden)
        ));
        assert!(policy
            .guard(&Method::GET, "/api/users/1", Some(&claims(UserRole::Admin)))
            .is_ok());
    }

    #[test]
    fn test_authenticated_and_fallback() {
        let policy = AccessPolicy::default_table();
        let customer = claims(UserRole::Customer);

        assert!(policy.guard(&Method::GET, "/api/bookings", Some(&customer)).is_ok());
        assert!(matches!(
            policy.guard(&Method::GET, "/api/dashboard/overview", None),
            Err(AuthError::MissingToken)
        ));
        assert_eq!(
            policy.access_for(&Method::GET, "/api/unknown"),
            Access::Authenticated
        );
    }

    #[test]
    fn test_first_match_wins() {
        let policy = AccessPolicy::new()
            .rule(&[], "/api/x/**", Access::Public)
            .rule(&[], "/api/x/**", Access::Role(UserRole::Admin));

        assert_eq!(policy.access_for(&Method::DELETE, "/api/x/1"), Access::Public);
    }
}
