//! Google Drive API connector
//!
//! Lists folders and authenticates accounts against Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::{Account, HttpClient, HttpRequest, RetryPolicy};
use core_auth::{AuthError, AuthManager, Authenticator, Credentials};
use core_drive::{check, Page, PageCursor, PageSource, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::types::{
    DriveFile, FilesListResponse, Reply, TokenRequest, TokenResponse, CODE_UNAUTHENTICATED,
};

pub const DRIVER_NAME: &str = "GoogleDrive";

/// Google Drive API base URL
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for file resources
const LIST_FIELDS: &str = "files(id,name,mimeType,size,modifiedTime),nextPageToken";

/// Server-side ordering of every listing
const LIST_ORDER: &str = "folder,name,modifiedTime desc";

pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Google Drive API connector
///
/// Serves every Google Drive account; the access token comes from the
/// account snapshot passed with each call.
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    auth: Arc<AuthManager>,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, retry: RetryPolicy, auth: Arc<AuthManager>) -> Self {
        Self {
            http_client,
            retry,
            auth,
        }
    }

    async fn get<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let request = request.header("Accept", "application/json");
        let response = self
            .http_client
            .execute_with_retry(request, self.retry.clone())
            .await?;
        Ok(response.json()?)
    }

    /// Media URL of `file`; callers stream it with a bearer token.
    pub fn media_url(file: &DriveFile) -> String {
        format!(
            "{}/files/{}?includeItemsFromAllDrives=true&supportsAllDrives=true&alt=media",
            DRIVE_API_BASE, file.id
        )
    }

    /// Fetches the metadata of `file`, which doubles as a token check.
    #[instrument(skip(self, account, file), fields(file_id = %file.id))]
    pub async fn get_metadata(&self, account: &Account, file: &DriveFile) -> Result<Reply<Metadata>> {
        let request = HttpRequest::get(format!("{}/files/{}", DRIVE_API_BASE, file.id))
            .bearer_token(&account.access_token)
            .query("includeItemsFromAllDrives", true)
            .query("supportsAllDrives", true);
        self.get(request).await
    }
}

#[async_trait]
impl Authenticator for GoogleDriveConnector {
    #[instrument(skip(self, account), fields(account = %account.name))]
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        let request = HttpRequest::post(TOKEN_URL).form(&TokenRequest {
            client_id: &account.client_id,
            client_secret: &account.client_secret,
            refresh_token: &account.refresh_token,
            grant_type: "refresh_token",
        })?;
        let response = self
            .http_client
            .execute_with_retry(request, self.retry.clone())
            .await?;
        let token: TokenResponse = response.json()?;

        if !token.error.is_empty() {
            debug!(description = %token.error_description, "Token grant rejected");
            return Err(AuthError::TokenRefreshFailed(token.error));
        }
        if token.access_token.is_empty() {
            return Err(AuthError::TokenRefreshFailed(
                "token endpoint returned no access_token".to_string(),
            ));
        }
        Ok(Credentials::new(token.access_token))
    }
}

#[async_trait]
impl PageSource for GoogleDriveConnector {
    type Entry = DriveFile;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn root_id(&self, account: &Account) -> String {
        if account.root_folder.is_empty() {
            "root".to_string()
        } else {
            account.root_folder.clone()
        }
    }

    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<DriveFile>> {
        let page_token = match cursor {
            PageCursor::Marker(token) => token.as_str(),
            PageCursor::Start | PageCursor::Number(_) => "",
        };

        let request = HttpRequest::get(format!("{}/files", DRIVE_API_BASE))
            .bearer_token(&account.access_token)
            .query("orderBy", LIST_ORDER)
            .query("fields", LIST_FIELDS)
            .query("pageSize", MAX_PAGE_SIZE)
            .query("q", format!("'{}' in parents and trashed = false", parent_id))
            .query("includeItemsFromAllDrives", true)
            .query("supportsAllDrives", true)
            .query("pageToken", page_token);

        let reply: Reply<FilesListResponse> = self.get(request).await?;
        let list = check(reply, CODE_UNAUTHENTICATED)?.data;

        match list.next_page_token {
            Some(token) if !token.is_empty() => {
                Ok(Page::more(list.files, PageCursor::Marker(token)))
            }
            _ => Ok(Page::last(list.files)),
        }
    }

    async fn reauthenticate(&self, account: &Account) -> Result<Account> {
        Ok(self.auth.refresh(account, self).await?)
    }
}
