use bridge_traits::BridgeError;
use core_auth::AuthError;
use core_drive::DriveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("no accounts, please add one first")]
    NoAccounts,

    #[error("no [{0}] account")]
    AccountNotFound(String),

    #[error("account [{0}] already exists")]
    AccountExists(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// True when the error comes from a path that does not exist, either
    /// outside every mount or inside an account.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::AccountNotFound(_) | ServiceError::Drive(DriveError::PathNotFound(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
