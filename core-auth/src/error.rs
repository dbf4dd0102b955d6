use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Provider {provider} login failed: {reason}")]
    LoginFailed { provider: String, reason: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Failed to persist account: {0}")]
    Persistence(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl AuthError {
    pub fn login_failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        AuthError::LoginFailed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Text stored as the account status after a failed attempt.
    ///
    /// Provider messages are kept verbatim so operators see what the
    /// provider actually said.
    pub fn status_reason(&self) -> String {
        match self {
            AuthError::LoginFailed { reason, .. } => reason.clone(),
            AuthError::TokenRefreshFailed(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
