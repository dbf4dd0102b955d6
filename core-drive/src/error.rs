use bridge_traits::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    /// Login or refresh failed; the account is marked not working
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Timeout or empty body after the transport retry budget ran out
    #[error("Request failed after retries: {0}")]
    Transient(String),

    /// The provider answered with a non-expiry error code
    #[error("{message}")]
    ProviderApi { code: String, message: String },

    /// The provider reported its access-token-invalid sentinel.
    ///
    /// Consumed by the refresh wrapper and the pager; callers only see it
    /// converted into [`DriveError::ProviderApi`].
    #[error("{message}")]
    SessionExpired { code: String, message: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error(transparent)]
    Bridge(BridgeError),
}

impl DriveError {
    pub fn api(code: impl ToString, message: impl Into<String>) -> Self {
        DriveError::ProviderApi {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn expired(code: impl ToString, message: impl Into<String>) -> Self {
        DriveError::SessionExpired {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, DriveError::SessionExpired { .. })
    }

    /// Converts the internal expiry signal into the error callers see once
    /// the refresh budget is spent.
    pub fn surfaced(self) -> Self {
        match self {
            DriveError::SessionExpired { code, message } => {
                DriveError::ProviderApi { code, message }
            }
            other => other,
        }
    }
}

impl From<BridgeError> for DriveError {
    fn from(err: BridgeError) -> Self {
        if err.is_transient() {
            DriveError::Transient(err.to_string())
        } else {
            DriveError::Bridge(err)
        }
    }
}

impl From<serde_json::Error> for DriveError {
    fn from(err: serde_json::Error) -> Self {
        DriveError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;
