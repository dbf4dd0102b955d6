//! AliDrive driver

use async_trait::async_trait;
use bridge_traits::Account;
use core_auth::{Authenticator, Credentials};
use core_drive::{
    with_refresh, Driver, DriverConfig, DriverContext, DriverDeps, DriveError, File, FormItem,
    ProxyHeaders, Result,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::{AliDriveApi, DRIVER_NAME, ROOT_ID};
use crate::types::{ACCESS_TOKEN_INVALID, MAX_LIMIT};

const REFERER: &str = "https://www.aliyundrive.com/";

/// Driver for AliDrive (aliyundrive.com) refresh-token accounts.
///
/// Every login is a refresh-token grant; the rotated refresh token is
/// persisted with the new access token. The first login also discovers the
/// account's default drive.
pub struct AliDriveDriver {
    ctx: DriverContext<AliDriveApi>,
}

impl AliDriveDriver {
    pub fn new(deps: DriverDeps) -> Self {
        let api = AliDriveApi::new(deps.http.clone(), deps.retry.clone(), deps.auth.clone());
        Self {
            ctx: DriverContext::new(deps, Arc::new(api)),
        }
    }

    pub fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self::new(deps))
    }

    fn api(&self) -> &AliDriveApi {
        self.ctx.source()
    }
}

#[async_trait]
impl Authenticator for AliDriveDriver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.api().authenticate(account).await
    }
}

#[async_trait]
impl Driver for AliDriveDriver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: DRIVER_NAME,
            only_proxy: false,
            local_sort: false,
        }
    }

    fn items(&self) -> Vec<FormItem> {
        vec![
            FormItem::select(
                "order_by",
                "order_by",
                &["name", "size", "updated_at", "created_at"],
            ),
            FormItem::select("order_direction", "order_direction", &["ASC", "DESC"]),
            FormItem::string("refresh_token", "refresh token").required(),
            FormItem::string("root_folder", "root folder file_id"),
            FormItem::number("limit", "limit").describe(">0 and <=200"),
        ]
    }

    fn prepare(&self, account: &mut Account) -> Result<()> {
        if account.refresh_token.is_empty() {
            return Err(DriveError::InvalidAccount(
                "refresh token is required".to_string(),
            ));
        }
        if account.limit > MAX_LIMIT {
            return Err(DriveError::InvalidAccount(format!(
                "limit must be at most {}",
                MAX_LIMIT
            )));
        }
        if account.limit == 0 {
            account.limit = MAX_LIMIT;
        }
        if account.root_folder.is_empty() {
            account.root_folder = ROOT_ID.to_string();
        }
        Ok(())
    }

    async fn file(&self, account: &str, path: &str) -> Result<File> {
        self.ctx.file(account, path).await
    }

    async fn files(&self, account: &str, path: &str) -> Result<Vec<File>> {
        self.ctx.files(account, path).await
    }

    #[instrument(skip(self))]
    async fn link(&self, account: &str, path: &str) -> Result<String> {
        let (snapshot, file) = self.ctx.link_target(account, path).await?;
        let api = self.api();

        let reply = with_refresh(
            snapshot,
            ACCESS_TOKEN_INVALID,
            |acc| {
                let file = &file;
                async move { api.download_url(&acc, file).await }
            },
            |acc| async move { self.ctx.refresh(&acc, api).await },
        )
        .await?;

        if reply.data.url.is_empty() {
            return Err(DriveError::Decode(
                "get_download_url without url".to_string(),
            ));
        }
        Ok(reply.data.url)
    }

    fn proxy_headers(&self, _account: &Account) -> ProxyHeaders {
        ProxyHeaders::default()
            .remove("Origin")
            .set("Referer", REFERER)
    }

    #[instrument(skip(self))]
    async fn preview(&self, account: &str, path: &str) -> Result<serde_json::Value> {
        let (snapshot, file) = self.ctx.link_target(account, path).await?;
        let api = self.api();

        let reply = with_refresh(
            snapshot,
            ACCESS_TOKEN_INVALID,
            |acc| {
                let file = &file;
                async move { api.preview(&acc, file).await }
            },
            |acc| async move { self.ctx.refresh(&acc, api).await },
        )
        .await?;
        Ok(serde_json::Value::Object(reply.data))
    }

    fn invalidate(&self, account: &str, path: &str) -> usize {
        self.ctx.invalidate(account, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{AccountStore, HttpClient, HttpRequest, HttpResponse, RetryPolicy};
    use bytes::Bytes;
    use core_auth::{AccountRegistry, AuthManager};
    use core_runtime::events::EventBus;
    use mockall::{mock, Sequence};
    use serde_json::json;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct MemoryStore;

    #[async_trait]
    impl AccountStore for MemoryStore {
        async fn save(&self, _account: &Account) -> BridgeResult<()> {
            Ok(())
        }
        async fn get(&self, _name: &str) -> BridgeResult<Option<Account>> {
            Ok(None)
        }
        async fn list(&self) -> BridgeResult<Vec<Account>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _name: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn respond(status: u16, body: serde_json::Value) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    fn body(request: &HttpRequest) -> serde_json::Value {
        request
            .body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
            .unwrap_or_default()
    }

    fn bearer(request: &HttpRequest) -> &str {
        request
            .headers
            .get("Authorization")
            .map(String::as_str)
            .unwrap_or("")
    }

    fn expired() -> BridgeResult<HttpResponse> {
        respond(
            401,
            json!({"code": "AccessTokenInvalid", "message": "AccessToken is invalid. expired"}),
        )
    }

    async fn driver(http: MockHttp) -> (AliDriveDriver, AccountRegistry) {
        let registry = AccountRegistry::new();
        let mut account = Account::new("ali", DRIVER_NAME);
        account.refresh_token = "r1".to_string();
        account.access_token = "a1".to_string();
        account.drive_id = "d1".to_string();
        account.root_folder = "root".to_string();
        account.limit = 200;
        account.status = "work".to_string();
        registry.insert(account).await;

        let auth = Arc::new(AuthManager::new(
            registry.clone(),
            Arc::new(MemoryStore),
            EventBus::default(),
        ));
        let deps = DriverDeps::new(Arc::new(http), auth, 16).with_retry(RetryPolicy::none());
        (AliDriveDriver::new(deps), registry)
    }

    fn root_listing(http: &mut MockHttp, seq: &mut Sequence, items: serde_json::Value) {
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/list") && body(r)["parent_file_id"] == "root")
            .times(1)
            .in_sequence(seq)
            .returning(move |_| respond(200, json!({"items": items.clone(), "next_marker": ""})));
    }

    #[tokio::test]
    async fn test_files_follow_next_marker() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        http.expect_execute()
            .withf(|r| {
                let b = body(r);
                r.url.ends_with("/file/list")
                    && b["marker"] == ""
                    && b["drive_id"] == "d1"
                    && b["limit"] == 200
                    && bearer(r) == "Bearer a1"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                respond(
                    200,
                    json!({"items": [{"file_id": "d", "name": "docs", "type": "folder"}],
                           "next_marker": "m2"}),
                )
            });
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/list") && body(r)["marker"] == "m2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                respond(
                    200,
                    json!({"items": [{"file_id": "p", "name": "cat.png", "type": "file",
                                      "category": "image", "size": 3}],
                           "next_marker": ""}),
                )
            });

        let (driver, _) = driver(http).await;
        let files = driver.files("ali", "/").await.unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].is_folder());
        assert_eq!(files[1].category, core_drive::FileCategory::Image);
    }

    #[tokio::test]
    async fn test_expired_listing_rotates_refresh_token() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/list") && bearer(r) == "Bearer a1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| expired());
        http.expect_execute()
            .withf(|r| {
                r.url == "https://auth.aliyundrive.com/v2/account/token"
                    && body(r)["refresh_token"] == "r1"
                    && body(r)["grant_type"] == "refresh_token"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"access_token": "a2", "refresh_token": "r2"})));
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/list") && bearer(r) == "Bearer a2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"items": [], "next_marker": ""})));

        let (driver, registry) = driver(http).await;
        driver.files("ali", "/").await.unwrap();

        let account = registry.get("ali").await.unwrap();
        assert_eq!(account.access_token, "a2");
        assert_eq!(account.refresh_token, "r2");
        assert_eq!(account.drive_id, "d1");
    }

    #[tokio::test]
    async fn test_first_login_discovers_default_drive() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        http.expect_execute()
            .withf(|r| r.url.ends_with("/account/token"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"access_token": "a2", "refresh_token": "r2"})));
        http.expect_execute()
            .withf(|r| r.url.ends_with("/user/get") && bearer(r) == "Bearer a2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"default_drive_id": "drive-9"})));

        let (driver, registry) = driver(http).await;
        let mut account = registry.get("ali").await.unwrap();
        account.drive_id.clear();

        let credentials = driver.authenticate(&account).await.unwrap();
        assert_eq!(credentials.drive_id.as_deref(), Some("drive-9"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_reports_message() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|r| r.url.ends_with("/account/token"))
            .times(1)
            .returning(|_| {
                respond(
                    400,
                    json!({"code": "InvalidParameter.RefreshToken", "message": "refresh_token is not valid"}),
                )
            });

        let (driver, registry) = driver(http).await;
        let account = registry.get("ali").await.unwrap();
        let err = driver.authenticate(&account).await.unwrap_err();

        assert_eq!(err.status_reason(), "refresh_token is not valid");
    }

    #[tokio::test]
    async fn test_link_retries_once_then_surfaces_message() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        root_listing(
            &mut http,
            &mut seq,
            json!([{"file_id": "f1", "name": "a.mkv", "type": "file", "size": 5}]),
        );
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/get_download_url") && body(r)["file_id"] == "f1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| expired());
        http.expect_execute()
            .withf(|r| r.url.ends_with("/account/token"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"access_token": "a2", "refresh_token": "r2"})));
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/get_download_url") && bearer(r) == "Bearer a2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| expired());

        let (driver, _) = driver(http).await;
        let err = driver.link("ali", "/a.mkv").await.unwrap_err();

        match err {
            DriveError::ProviderApi { code, message } => {
                assert_eq!(code, "AccessTokenInvalid");
                assert_eq!(message, "AccessToken is invalid. expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_link_returns_signed_url() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        root_listing(
            &mut http,
            &mut seq,
            json!([{"file_id": "f1", "name": "a.mkv", "type": "file", "size": 5}]),
        );
        http.expect_execute()
            .withf(|r| r.url.ends_with("/file/get_download_url") && body(r)["expire_sec"] == 14400)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| respond(200, json!({"url": "https://bj29.cn-beijing.data.alicloudccp.com/a"})));

        let (driver, _) = driver(http).await;
        let url = driver.link("ali", "/a.mkv").await.unwrap();

        assert_eq!(url, "https://bj29.cn-beijing.data.alicloudccp.com/a");
    }

    #[tokio::test]
    async fn test_video_preview_requests_transcoding() {
        let mut http = MockHttp::new();
        let mut seq = Sequence::new();
        root_listing(
            &mut http,
            &mut seq,
            json!([{"file_id": "v1", "name": "a.mkv", "type": "file", "category": "video"},
                   {"file_id": "z1", "name": "a.zip", "type": "file", "category": "zip"}]),
        );
        http.expect_execute()
            .withf(|r| {
                r.url.ends_with("/file/get_video_preview_play_info")
                    && body(r)["category"] == "live_transcoding"
                    && body(r).get("access_token").is_none()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                respond(200, json!({"video_preview_play_info": {"live_transcoding_task_list": []}}))
            });

        let (driver, _) = driver(http).await;
        let preview = driver.preview("ali", "/a.mkv").await.unwrap();
        assert!(preview.get("video_preview_play_info").is_some());

        let err = driver.preview("ali", "/a.zip").await.unwrap_err();
        assert!(matches!(err, DriveError::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_prepare_defaults_and_limits() {
        let (driver, _) = driver(MockHttp::new()).await;

        let mut account = Account::new("new", DRIVER_NAME);
        assert!(driver.prepare(&mut account).is_err());

        account.refresh_token = "r".to_string();
        account.limit = 500;
        assert!(driver.prepare(&mut account).is_err());

        account.limit = 0;
        driver.prepare(&mut account).unwrap();
        assert_eq!(account.limit, 200);
        assert_eq!(account.root_folder, "root");

        let headers = driver.proxy_headers(&account);
        assert_eq!(headers.remove, vec!["Origin".to_string()]);
        assert_eq!(
            headers.set,
            vec![("Referer".to_string(), "https://www.aliyundrive.com/".to_string())]
        );
    }
}
