//! Microsoft Graph client for OneDrive and SharePoint document libraries.

use async_trait::async_trait;
use bridge_traits::{Account, HttpClient, HttpRequest, RetryPolicy};
use core_auth::{AuthError, AuthManager, Authenticator, Credentials};
use core_drive::{check, Page, PageCursor, PageSource, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::host;
use crate::types::{
    Children, DriveItem, ItemLink, Reply, TokenRequest, TokenResponse,
    INVALID_AUTHENTICATION_TOKEN,
};

pub const DRIVER_NAME: &str = "Onedrive";

/// Placeholder id of the mount root; the real item is addressed by path.
pub const ROOT_MARKER: &str = "root";

pub struct OneDriveApi {
    http: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    auth: Arc<AuthManager>,
}

impl OneDriveApi {
    pub fn new(http: Arc<dyn HttpClient>, retry: RetryPolicy, auth: Arc<AuthManager>) -> Self {
        Self { http, retry, auth }
    }

    async fn get<T: DeserializeOwned>(&self, account: &Account, url: String) -> Result<T> {
        let request = HttpRequest::get(url).bearer_token(&account.access_token);
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        Ok(response.json()?)
    }

    fn children_url(account: &Account, parent_id: &str) -> Result<String> {
        if parent_id == ROOT_MARKER {
            Ok(format!("{}/children", host::root_item(account)?))
        } else {
            Ok(format!(
                "{}/items/{}/children",
                host::drive_base(account)?,
                parent_id
            ))
        }
    }

    /// Fresh metadata of `item`, including a short-lived download URL.
    #[instrument(skip(self, account, item), fields(item_id = %item.id))]
    pub async fn item(&self, account: &Account, item: &DriveItem) -> Result<Reply<ItemLink>> {
        let url = format!("{}/items/{}", host::drive_base(account)?, item.id);
        self.get(account, url).await
    }
}

#[async_trait]
impl Authenticator for OneDriveApi {
    #[instrument(skip(self, account), fields(account = %account.name, zone = %account.zone))]
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        let url = host::token_url(account)
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;
        let request = HttpRequest::post(url).form(&TokenRequest {
            grant_type: "refresh_token",
            client_id: &account.client_id,
            client_secret: &account.client_secret,
            redirect_uri: &account.redirect_uri,
            refresh_token: &account.refresh_token,
        })?;
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        let token: TokenResponse = response.json()?;

        if !token.error.is_empty() || token.access_token.is_empty() {
            let reason = if token.error_description.is_empty() {
                token.error
            } else {
                token.error_description
            };
            return Err(AuthError::TokenRefreshFailed(reason));
        }

        debug!("Refresh token grant accepted");
        let mut credentials = Credentials::new(token.access_token);
        if !token.refresh_token.is_empty() {
            credentials = credentials.with_refresh_token(token.refresh_token);
        }
        Ok(credentials)
    }
}

#[async_trait]
impl PageSource for OneDriveApi {
    type Entry = DriveItem;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn root_id(&self, _account: &Account) -> String {
        ROOT_MARKER.to_string()
    }

    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<DriveItem>> {
        let url = match cursor {
            PageCursor::Marker(next_link) => next_link.clone(),
            PageCursor::Start | PageCursor::Number(_) => Self::children_url(account, parent_id)?,
        };
        let reply: Reply<Children> = self.get(account, url).await?;
        let children = check(reply, INVALID_AUTHENTICATION_TOKEN)?.data;

        match children.next_link {
            Some(next) if !next.is_empty() => {
                Ok(Page::more(children.value, PageCursor::Marker(next)))
            }
            _ => Ok(Page::last(children.value)),
        }
    }

    async fn reauthenticate(&self, account: &Account) -> Result<Account> {
        Ok(self.auth.refresh(account, self).await?)
    }
}
