//! 123Pan web API client.

use async_trait::async_trait;
use bridge_traits::{Account, HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use core_auth::{AuthError, AuthManager, Authenticator, Credentials};
use core_drive::{check, DriveError, Page, PageCursor, PageSource, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::types::{
    DownloadInfo, DownloadInfoRequest, Envelope, FileList, Pan123File, SignInRequest, TokenData,
    CODE_TOKEN_EXPIRED, LAST_PAGE, SIGN_IN_OK,
};

pub const API_BASE: &str = "https://www.123pan.com/api";

pub const DRIVER_NAME: &str = "123Pan";

/// Entries requested per `file/list` page
const PAGE_LIMIT: u32 = 100;

pub struct Pan123Api {
    http: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    auth: Arc<AuthManager>,
}

impl Pan123Api {
    pub fn new(http: Arc<dyn HttpClient>, retry: RetryPolicy, auth: Arc<AuthManager>) -> Self {
        Self { http, retry, auth }
    }

    async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        Ok(response.json()?)
    }

    /// Requests a signed download URL for `file`.
    pub async fn download_info(
        &self,
        account: &Account,
        file: &Pan123File,
    ) -> Result<Envelope<DownloadInfo>> {
        let file_id = file
            .file_id
            .parse::<i64>()
            .map_err(|e| DriveError::Decode(format!("FileId {}: {}", file.file_id, e)))?;

        let request = HttpRequest::post(format!("{}/file/download_info", API_BASE))
            .bearer_token(&account.access_token)
            .json(&DownloadInfoRequest {
                drive_id: 0,
                etag: &file.etag,
                file_id,
                file_name: &file.file_name,
                s3_key_flag: &file.s3_key_flag,
                size: file.size,
                r#type: file.r#type,
            })?;
        self.send(request).await
    }

    /// Issues the signed URL without following redirects and returns the
    /// final location when the CDN redirects.
    pub async fn resolve_redirect(&self, download_url: &str) -> Result<String> {
        let parsed = url::Url::parse(download_url)
            .map_err(|e| DriveError::Decode(format!("download url: {}", e)))?;
        let host = parsed.host_str().unwrap_or_default();

        let mut request = HttpRequest::get(format!("https://{}{}", host, parsed.path())).no_redirect();
        for (key, value) in parsed.query_pairs() {
            request = request.query(key, value);
        }

        let response: HttpResponse = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        match response.header("location") {
            Some(location) if response.status == 302 => Ok(location.to_string()),
            _ => {
                debug!(status = response.status, "Download URL did not redirect");
                Ok(download_url.to_string())
            }
        }
    }
}

#[async_trait]
impl Authenticator for Pan123Api {
    #[instrument(skip(self, account), fields(account = %account.name))]
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        let request = HttpRequest::post(format!("{}/user/sign_in", API_BASE)).json(&SignInRequest {
            passport: &account.username,
            password: &account.password,
        })?;
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        let body: Envelope<TokenData> = response.json()?;

        match body.data {
            Some(data) if body.code == SIGN_IN_OK => Ok(Credentials::new(data.token)),
            _ => Err(AuthError::login_failed(DRIVER_NAME, body.message)),
        }
    }
}

#[async_trait]
impl PageSource for Pan123Api {
    type Entry = Pan123File;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn root_id(&self, account: &Account) -> String {
        if account.root_folder.is_empty() {
            "0".to_string()
        } else {
            account.root_folder.clone()
        }
    }

    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<Pan123File>> {
        let next = match cursor {
            PageCursor::Start => "0".to_string(),
            PageCursor::Marker(marker) => marker.clone(),
            PageCursor::Number(n) => n.to_string(),
        };

        let request = HttpRequest::get(format!("{}/file/list", API_BASE))
            .bearer_token(&account.access_token)
            .query("driveId", 0)
            .query("limit", PAGE_LIMIT)
            .query("next", next)
            .query("orderBy", &account.order_by)
            .query("orderDirection", &account.order_direction)
            .query("parentFileId", parent_id)
            .query("trashed", false);

        let body: Envelope<FileList> = check(self.send(request).await?, CODE_TOKEN_EXPIRED)?;
        let list = body.data.unwrap_or(FileList {
            info_list: Vec::new(),
            next: LAST_PAGE.to_string(),
        });

        if list.next == LAST_PAGE || list.next.is_empty() {
            Ok(Page::last(list.info_list))
        } else {
            Ok(Page::more(list.info_list, PageCursor::Marker(list.next)))
        }
    }

    async fn reauthenticate(&self, account: &Account) -> Result<Account> {
        Ok(self.auth.refresh(account, self).await?)
    }
}
