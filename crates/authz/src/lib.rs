//! Authorization hooks and guards.
//!
//! Credentials are verified upstream; the gateway forwards the caller as
//! `x-user-id` / `x-user-role` headers and this crate turns them into an
//! [`Identity`] with role checks.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role attached to a user account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authenticated identity")]
    MissingIdentity,

    #[error("unknown role '{0}'")]
    InvalidRole(String),

    #[error("{0}")]
    Forbidden(&'static str),
}

/// The caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Read the forwarded identity headers. The role defaults to `user`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingIdentity)?;

        let role = match headers.get(USER_ROLE_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| AuthError::InvalidRole("<non-ascii>".to_string()))?
                .parse::<Role>()?,
            None => Role::User,
        };

        Ok(Self::new(user_id, role))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, "admin role required");
            Err(AuthError::Forbidden("admin role required"))
        }
    }

    /// Allow the owner of `user_id` and administrators
    pub fn require_self_or_admin(&self, user_id: &str) -> Result<(), AuthError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %self.user_id,
                target = %user_id,
                "access to another user's account denied"
            );
            Err(AuthError::Forbidden("not allowed to access this user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn identity_defaults_to_user_role() {
        let identity = Identity::from_headers(&headers(&[(USER_ID_HEADER, "u1")])).unwrap();
        assert_eq!(identity, Identity::new("u1", Role::User));
    }

    #[test]
    fn identity_reads_admin_role() {
        let identity =
            Identity::from_headers(&headers(&[(USER_ID_HEADER, "u1"), (USER_ROLE_HEADER, "Admin")]))
                .unwrap();
        assert!(identity.is_admin());
    }

    #[test]
    fn missing_or_blank_identity_is_rejected() {
        assert_eq!(
            Identity::from_headers(&HeaderMap::new()),
            Err(AuthError::MissingIdentity)
        );
        assert_eq!(
            Identity::from_headers(&headers(&[(USER_ID_HEADER, "  ")])),
            Err(AuthError::MissingIdentity)
        );
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result =
            Identity::from_headers(&headers(&[(USER_ID_HEADER, "u1"), (USER_ROLE_HEADER, "root")]));
        assert_eq!(result, Err(AuthError::InvalidRole("root".to_string())));
    }

    #[test]
    fn guards() {
        let user = Identity::new("u1", Role::User);
        let admin = Identity::new("a1", Role::Admin);

        assert!(user.require_self_or_admin("u1").is_ok());
        assert!(user.require_self_or_admin("u2").is_err());
        assert!(admin.require_self_or_admin("u2").is_ok());
        assert!(user.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
