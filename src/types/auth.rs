//! Authentication Types
//!
//! Types for the market data backend session and the locally stored user.

use serde::{Deserialize, Serialize};

/// Login credentials for the market data backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Whether either field is blank.
    pub fn is_blank(&self) -> bool {
        self.email.trim().is_empty() || self.password.is_empty()
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Session state of the market data backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    /// Opaque bearer token, never validated downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Public view of the auth state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub has_token: bool,
}

impl From<&AuthState> for AuthStatus {
    fn from(state: &AuthState) -> Self {
        Self {
            authenticated: state.is_authenticated,
            has_token: state.token.is_some(),
        }
    }
}

/// User record kept under the "user" key of the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl StoredUser {
    /// Create a local fallback user. The name defaults to the email's local part.
    pub fn local(email: &str, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Self {
            id: format!("local-{}", chrono::Utc::now().timestamp_millis()),
            email: email.to_string(),
            name,
        }
    }
}
