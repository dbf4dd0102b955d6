//! 189 Cloud web API client.
//!
//! Every call rides on the cookie session established by the last login of
//! the account. Sessions live in memory only; after a restart the first call
//! reports an expired session and triggers a fresh login.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{Account, HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use chrono::Utc;
use core_auth::{AuthError, AuthManager, Authenticator, Credentials};
use core_drive::{check, Page, PageCursor, PageSource, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

use crate::crypto::{encrypt_field, no_cache};
use crate::login::LoginPage;
use crate::session::CookieJar;
use crate::types::{
    Cloud189File, DownloadData, ListData, LoginForm, LoginResult, Reply, INVALID_SESSION_KEY,
};

pub const DRIVER_NAME: &str = "189Cloud";

const LOGIN_URL: &str = "https://cloud.189.cn/api/portal/loginUrl.action";
const MAIN_URL: &str = "https://cloud.189.cn/main.action";
const LOGIN_SUBMIT_URL: &str = "https://open.e.189.cn/api/logbox/oauth2/loginSubmit.do";
const LOGIN_REFERER: &str = "https://open.e.189.cn/";
const LIST_URL: &str = "https://cloud.189.cn/api/open/file/listFiles.action";
const DOWNLOAD_URL: &str = "https://cloud.189.cn/api/open/file/getFileDownloadUrl.action";
const JSON_ACCEPT: &str = "application/json;charset=UTF-8";

/// Cookie whose value identifies a logged-in session
const SESSION_COOKIE: &str = "COOKIE_LOGIN_USER";

const PAGE_SIZE: u32 = 60;

const MAX_REDIRECTS: usize = 10;

pub struct Cloud189Api {
    http: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    auth: Arc<AuthManager>,
    sessions: Mutex<HashMap<String, CookieJar>>,
}

impl<T: Default> Reply<T> {
    fn session_missing() -> Self {
        Self {
            res_code: 0,
            res_message: String::new(),
            error_code: INVALID_SESSION_KEY.to_string(),
            error_msg: "no session for this account".to_string(),
            data: T::default(),
        }
    }
}

fn full_url(request: &HttpRequest) -> BridgeResult<Url> {
    Url::parse_with_params(&request.url, &request.query)
        .map_err(|e| BridgeError::OperationFailed(format!("invalid url {}: {}", request.url, e)))
}

impl Cloud189Api {
    pub fn new(http: Arc<dyn HttpClient>, retry: RetryPolicy, auth: Arc<AuthManager>) -> Self {
        Self {
            http,
            retry,
            auth,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_session(&self, account: &str) -> bool {
        self.sessions.lock().contains_key(account)
    }

    /// Drops the cookie session of `account`.
    pub fn forget(&self, account: &str) {
        if self.sessions.lock().remove(account).is_some() {
            debug!(account, "Dropped 189 session");
        }
    }

    /// Sends `request` and follows redirects by hand so cookies set on every
    /// hop land in `jar`.
    async fn follow(&self, jar: &mut CookieJar, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let mut request = request;
        for _ in 0..=MAX_REDIRECTS {
            let target = full_url(&request)?;
            if let Some(cookie) = jar.header_for(&target) {
                request = request.header("Cookie", cookie);
            }
            let response = self
                .http
                .execute_with_retry(request.no_redirect(), self.retry.clone())
                .await?;
            jar.store_all(&target, response.set_cookies());

            match response.header("location") {
                Some(location) if response.is_redirect() => {
                    let next = target.join(location).map_err(|e| {
                        BridgeError::OperationFailed(format!("bad redirect {}: {}", location, e))
                    })?;
                    request = HttpRequest::get(next.to_string());
                }
                _ => return Ok(response),
            }
        }
        Err(BridgeError::OperationFailed(format!(
            "more than {} redirects",
            MAX_REDIRECTS
        )))
    }

    /// Issues an `api/open` call inside the account's cookie session.
    async fn send<T: DeserializeOwned + Default>(
        &self,
        account: &Account,
        request: HttpRequest,
    ) -> Result<Reply<T>> {
        let target = full_url(&request)?;
        let cookie = match self.sessions.lock().get(&account.name) {
            Some(jar) => jar.header_for(&target),
            None => return Ok(Reply::session_missing()),
        };

        let mut request = request.header("Accept", JSON_ACCEPT);
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;

        if let Some(jar) = self.sessions.lock().get_mut(&account.name) {
            jar.store_all(&target, response.set_cookies());
        }
        Ok(response.json()?)
    }

    pub async fn download_url(
        &self,
        account: &Account,
        file: &Cloud189File,
    ) -> Result<Reply<DownloadData>> {
        let request = HttpRequest::get(DOWNLOAD_URL)
            .query("noCache", no_cache())
            .query("fileId", &file.id);
        self.send(account, request).await
    }

    /// Location of the storage node when the download URL redirects.
    pub async fn resolve_redirect(&self, download_url: &str) -> Result<String> {
        let request = HttpRequest::get(download_url).no_redirect();
        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        match response.header("location") {
            Some(location) if response.status == 302 => Ok(location.to_string()),
            _ => Ok(download_url.to_string()),
        }
    }
}

#[async_trait]
impl Authenticator for Cloud189Api {
    #[instrument(skip(self, account), fields(account = %account.name))]
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        let login_failed = |reason: String| AuthError::login_failed(DRIVER_NAME, reason);
        let mut jar = CookieJar::new();

        let page = self
            .follow(
                &mut jar,
                HttpRequest::get(LOGIN_URL).query("redirectURL", MAIN_URL),
            )
            .await?;
        let form = LoginPage::scrape(&page.text()?).map_err(login_failed)?;

        let user_name = encrypt_field(&account.username, &form.rsa_key).map_err(login_failed)?;
        let password = encrypt_field(&account.password, &form.rsa_key).map_err(login_failed)?;

        let submit = HttpRequest::post(LOGIN_SUBMIT_URL)
            .header("lt", &form.lt)
            .header("Referer", LOGIN_REFERER)
            .header("Accept", JSON_ACCEPT)
            .form(&LoginForm {
                app_key: "cloud",
                account_type: "01",
                user_name: &user_name,
                password: &password,
                validate_code: "",
                captcha_token: &form.captcha_token,
                return_url: &form.return_url,
                mail_suffix: "@pan.cn",
                param_id: &form.param_id,
                client_type: "10010",
                dynamic_check: "FALSE",
                cb_save_name: "1",
                is_oauth2: "false",
            })?;
        let result: LoginResult = self.follow(&mut jar, submit).await?.json()?;
        if result.result != 0 {
            return Err(login_failed(result.msg));
        }
        if !result.to_url.is_empty() {
            self.follow(&mut jar, HttpRequest::get(&result.to_url)).await?;
        }

        // The access token only marks the login generation; the cookies carry the session.
        let marker = match jar.get(SESSION_COOKIE) {
            Some(value) => value.to_string(),
            None => format!("session-{}", Utc::now().timestamp_millis()),
        };
        self.sessions.lock().insert(account.name.clone(), jar);
        info!("189 session established");
        Ok(Credentials::new(marker))
    }
}

#[async_trait]
impl PageSource for Cloud189Api {
    type Entry = Cloud189File;

    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn root_id(&self, account: &Account) -> String {
        account.root_folder.clone()
    }

    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<Cloud189File>> {
        let page_num = match cursor {
            PageCursor::Start => 1,
            PageCursor::Number(n) => *n,
            PageCursor::Marker(marker) => marker.parse().unwrap_or(1),
        };

        let request = HttpRequest::get(LIST_URL)
            .query("noCache", no_cache())
            .query("pageSize", PAGE_SIZE)
            .query("pageNum", page_num)
            .query("mediaType", 0)
            .query("folderId", parent_id)
            .query("iconOption", 5)
            .query("orderBy", &account.order_by)
            .query("descending", &account.order_direction);

        let reply = check(self.send::<ListData>(account, request).await?, INVALID_SESSION_KEY)?;
        let listing = reply.data.file_list_ao.unwrap_or_default();
        if listing.count == 0 {
            Ok(Page::last(Vec::new()))
        } else {
            Ok(Page::more(
                listing.into_entries(),
                PageCursor::Number(page_num + 1),
            ))
        }
    }

    async fn reauthenticate(&self, account: &Account) -> Result<Account> {
        Ok(self.auth.refresh(account, self).await?)
    }
}
