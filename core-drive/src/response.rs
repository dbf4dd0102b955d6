//! Response-Error Contract and the bounded refresh wrapper.

use bridge_traits::Account;
use std::future::Future;
use tracing::debug;

use crate::error::{DriveError, Result};

/// Minimal shape every decoded provider response exposes.
pub trait ApiResponse {
    fn is_success(&self) -> bool;

    fn error_code(&self) -> String;

    fn error_message(&self) -> String;

    /// Resets the error code so the value can be reused for a retry
    fn clear_code(&mut self);
}

/// Turns a decoded response into `Ok`, [`DriveError::SessionExpired`] when
/// the code equals `expiry_code`, or [`DriveError::ProviderApi`].
pub fn check<R: ApiResponse>(response: R, expiry_code: &str) -> Result<R> {
    if response.is_success() {
        return Ok(response);
    }
    let code = response.error_code();
    if code == expiry_code {
        Err(DriveError::expired(code, response.error_message()))
    } else {
        Err(DriveError::api(code, response.error_message()))
    }
}

/// Issues `call`; on the expiry sentinel refreshes once and issues it again.
///
/// At most one refresh happens per invocation. A second expiry, or any
/// other error code, is returned as [`DriveError::ProviderApi`] carrying the
/// provider's message unchanged.
pub async fn with_refresh<R, C, CFut, F, FFut>(
    account: Account,
    expiry_code: &str,
    mut call: C,
    refresh: F,
) -> Result<R>
where
    R: ApiResponse,
    C: FnMut(Account) -> CFut,
    CFut: Future<Output = Result<R>>,
    F: FnOnce(Account) -> FFut,
    FFut: Future<Output = Result<Account>>,
{
    let mut account = account;
    let mut refresh = Some(refresh);

    loop {
        let mut response = call(account.clone()).await?;
        if response.is_success() {
            return Ok(response);
        }

        let code = response.error_code();
        match refresh.take() {
            Some(refresh) if code == expiry_code => {
                debug!(account = %account.name, code = %code, "Session expired, refreshing before retry");
                response.clear_code();
                account = refresh(account).await?;
            }
            _ => return Err(DriveError::api(code, response.error_message())),
        }
    }
}
