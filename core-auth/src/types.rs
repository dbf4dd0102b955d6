use serde::{Deserialize, Serialize};
use std::fmt;

/// Account status written after a successful login or refresh.
pub const STATUS_WORKING: &str = "work";

/// Fresh credentials returned by a provider login or refresh.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub access_token: String,
    /// Providers that rotate refresh tokens return the new one here
    pub refresh_token: Option<String>,
    /// Drive discovered during login (AliDrive `default_drive_id`)
    pub drive_id: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_drive_id(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("drive_id", &self.drive_id)
            .finish()
    }
}

/// Display form of an account's status.
///
/// Stored statuses only ever map to `Valid` or `Invalid`; `Refreshing` is
/// reported by `AuthManager::state` while a refresh is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Valid,
    Refreshing,
    Invalid { reason: String },
}

impl AuthState {
    pub fn from_status(status: &str) -> Self {
        match status {
            STATUS_WORKING => AuthState::Valid,
            "" => AuthState::Invalid {
                reason: "never authenticated".to_string(),
            },
            reason => AuthState::Invalid {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, AuthState::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_tokens() {
        let creds = Credentials::new("secret-access").with_refresh_token("secret-refresh");
        let rendered = format!("{:?}", creds);

        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("drive_id: None"));
    }

    #[test]
    fn test_state_from_status() {
        assert_eq!(AuthState::from_status("work"), AuthState::Valid);
        assert_eq!(
            AuthState::from_status("refreshing"),
            AuthState::Invalid {
                reason: "refreshing".to_string()
            }
        );
        assert_eq!(
            AuthState::from_status("InvalidSessionKey"),
            AuthState::Invalid {
                reason: "InvalidSessionKey".to_string()
            }
        );
        assert!(!AuthState::from_status("").is_valid());
    }
}
