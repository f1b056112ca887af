use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ServiceError;

/// Bearer token issued by the marketplace backend at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns `None` for blank tokens so an empty string never counts as logged in.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Who is checking out. Passed explicitly into every operation that talks to
/// the backend on the user's behalf.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    token: Option<AccessToken>,
    user: Option<UserProfile>,
}

impl AuthSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: AccessToken, user: Option<UserProfile>) -> Self {
        Self {
            token: Some(token),
            user,
        }
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The access token, or `AuthRequired` when the user is not logged in.
    pub fn require_token(&self) -> Result<&AccessToken, ServiceError> {
        self.token.as_ref().ok_or(ServiceError::AuthRequired)
    }

    /// Drops the token, e.g. after the backend reported it expired.
    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_token_is_rejected() {
        assert!(AccessToken::new("   ").is_none());
        assert_eq!(AccessToken::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn debug_redacts_token() {
        let token = AccessToken::new("secret-jwt").unwrap();
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
    }

    #[test]
    fn anonymous_session_requires_login() {
        let session = AuthSession::anonymous();
        assert!(!session.is_authenticated());
        assert_matches!(session.require_token(), Err(ServiceError::AuthRequired));
    }

    #[test]
    fn logout_clears_session() {
        let mut session = AuthSession::authenticated(AccessToken::new("t").unwrap(), None);
        assert!(session.require_token().is_ok());
        session.logout();
        assert!(!session.is_authenticated());
    }
}
