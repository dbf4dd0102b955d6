//! AliDrive web API client.

use async_trait::async_trait;
use bridge_traits::{Account, HttpClient, HttpRequest, RetryPolicy};
use core_auth::{AuthError, AuthManager, Authenticator, Credentials};
use core_drive::{check, DriveError, Page, PageCursor, PageSource, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::types::{
    AliFile, DownloadRequest, DownloadUrl, FileList, ListRequest, PreviewRequest, Reply,
    TokenData, TokenRequest, UserInfo, ACCESS_TOKEN_INVALID, MAX_LIMIT, URL_EXPIRE_SEC,
};

pub const DRIVER_NAME: &str = "AliDrive";

pub const API_BASE: &str = "https://api.aliyundrive.com/v2";

const TOKEN_URL: &str = "https://auth.aliyundrive.com/v2/account/token";

const ORIGIN: &str = "https://aliyundrive.com";

/// Root `parent_file_id` of every drive
pub const ROOT_ID: &str = "root";

pub type PreviewData = serde_json::Map<String, serde_json::Value>;

pub struct AliDriveApi {
    http: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    auth: Arc<AuthManager>,
}

impl AliDriveApi {
    pub fn new(http: Arc<dyn HttpClient>, retry: RetryPolicy, auth: Arc<AuthManager>) -> Self {
        Self { http, retry, auth }
    }

    async fn post<B, T>(&self, url: &str, token: &str, body: &B) -> Result<Reply<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = HttpRequest::post(url)
            .header("Origin", ORIGIN)
            .bearer_token(token)
            .json(body)?;
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        Ok(response.json()?)
    }

    pub async fn download_url(&self, account: &Account, file: &AliFile) -> Result<Reply<DownloadUrl>> {
        self.post(
            &format!("{}/file/get_download_url", API_BASE),
            &account.access_token,
            &DownloadRequest {
                drive_id: &account.drive_id,
                file_id: &file.file_id,
                expire_sec: URL_EXPIRE_SEC,
            },
        )
        .await
    }

    /// Office preview URL for documents, transcoding play info for videos.
    pub async fn preview(&self, account: &Account, file: &AliFile) -> Result<Reply<PreviewData>> {
        let (endpoint, access_token, category) = match file.category.as_str() {
            "doc" => ("get_office_preview_url", Some(account.access_token.as_str()), None),
            "video" => ("get_video_preview_play_info", None, Some("live_transcoding")),
            other => {
                return Err(DriveError::NotSupported(format!(
                    "no preview for category '{}'",
                    other
                )))
            }
        };
        self.post(
            &format!("{}/file/{}", API_BASE, endpoint),
            &account.access_token,
            &PreviewRequest {
                drive_id: &account.drive_id,
                file_id: &file.file_id,
                access_token,
                category,
            },
        )
        .await
    }

    async fn default_drive_id(&self, access_token: &str) -> core_auth::Result<String> {
        let reply: Reply<UserInfo> = self
            .post(&format!("{}/user/get", API_BASE), access_token, &serde_json::json!({}))
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;
        if !reply.code.is_empty() || reply.data.default_drive_id.is_empty() {
            return Err(AuthError::TokenRefreshFailed(format!(
                "user/get returned no default drive: {}",
                reply.message
            )));
        }
        Ok(reply.data.default_drive_id)
    }
}

#[async_trait]
impl Authenticator for AliDriveApi {
    #[instrument(skip(self, account), fields(account = %account.name))]
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        let request = HttpRequest::post(TOKEN_URL)
            .header("Origin", ORIGIN)
            .json(&TokenRequest {
                refresh_token: &account.refresh_token,
                grant_type: "refresh_token",
            })?;
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        let reply: Reply<TokenData> = response.json()?;

        if !reply.code.is_empty() || reply.data.access_token.is_empty() {
            return Err(AuthError::TokenRefreshFailed(reply.message));
        }

        let token = reply.data;
        let mut credentials =
            Credentials::new(token.access_token.clone()).with_refresh_token(token.refresh_token);
        if account.drive_id.is_empty() {
            let drive_id = if token.default_drive_id.is_empty() {
                self.default_drive_id(&token.access_token).await?
            } else {
                token.default_drive_id
            };
            debug!(drive_id = %drive_id, "Discovered default drive");
            credentials = credentials.with_drive_id(drive_id);
        }
        Ok(credentials)
    }
}

#[async_trait]
impl PageSource for AliDriveApi {
    type Entry = AliFile;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn root_id(&self, account: &Account) -> String {
        if account.root_folder.is_empty() {
            ROOT_ID.to_string()
        } else {
            account.root_folder.clone()
        }
    }

    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<AliFile>> {
        let marker = match cursor {
            PageCursor::Marker(marker) => marker.clone(),
            PageCursor::Start | PageCursor::Number(_) => String::new(),
        };
        let limit = match account.limit {
            0 => MAX_LIMIT,
            n => n.min(MAX_LIMIT),
        };

        let body = ListRequest {
            drive_id: &account.drive_id,
            fields: "*",
            image_thumbnail_process: "image/resize,w_400/format,jpeg",
            image_url_process: "image/resize,w_1920/format,jpeg",
            limit,
            marker: &marker,
            order_by: &account.order_by,
            order_direction: &account.order_direction,
            parent_file_id: parent_id,
            video_thumbnail_process: "video/snapshot,t_0,f_jpg,ar_auto,w_300",
            url_expire_sec: URL_EXPIRE_SEC,
        };
        let reply: Reply<FileList> = self
            .post(&format!("{}/file/list", API_BASE), &account.access_token, &body)
            .await?;
        let list = check(reply, ACCESS_TOKEN_INVALID)?.data;

        if list.next_marker.is_empty() {
            Ok(Page::last(list.items))
        } else {
            Ok(Page::more(list.items, PageCursor::Marker(list.next_marker)))
        }
    }

    async fn reauthenticate(&self, account: &Account) -> Result<Account> {
        Ok(self.auth.refresh(account, self).await?)
    }
}
