//! OneDrive / SharePoint driver

use async_trait::async_trait;
use bridge_traits::Account;
use core_auth::{Authenticator, Credentials};
use core_drive::{
    path, with_refresh, Driver, DriverConfig, DriverContext, DriverDeps, DriveError, File,
    FormItem, ProxyHeaders, Result,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::{OneDriveApi, DRIVER_NAME};
use crate::host::{self, ZONE_NAMES};
use crate::types::INVALID_AUTHENTICATION_TOKEN;

/// Driver for Microsoft Graph drives in any national cloud.
///
/// Graph returns children unordered, so listings are sorted locally by the
/// account's `order_by`/`order_direction`.
pub struct OneDriveDriver {
    ctx: DriverContext<OneDriveApi>,
}

impl OneDriveDriver {
    pub fn new(deps: DriverDeps) -> Self {
        let api = OneDriveApi::new(deps.http.clone(), deps.retry.clone(), deps.auth.clone());
        Self {
            ctx: DriverContext::new(deps, Arc::new(api)),
        }
    }

    pub fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self::new(deps))
    }

    fn api(&self) -> &OneDriveApi {
        self.ctx.source()
    }
}

#[async_trait]
impl Authenticator for OneDriveDriver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.api().authenticate(account).await
    }
}

#[async_trait]
impl Driver for OneDriveDriver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: DRIVER_NAME,
            only_proxy: false,
            local_sort: true,
        }
    }

    fn items(&self) -> Vec<FormItem> {
        vec![
            FormItem::select("zone", "zone", ZONE_NAMES).required(),
            FormItem::select("onedrive_type", "onedrive type", &["onedrive", "sharepoint"])
                .required(),
            FormItem::string("client_id", "client id").required(),
            FormItem::string("client_secret", "client secret").required(),
            FormItem::string("redirect_uri", "redirect uri").required(),
            FormItem::string("refresh_token", "refresh token").required(),
            FormItem::string("site_id", "site id").describe("sharepoint only"),
            FormItem::string("root_folder", "root folder path"),
            FormItem::select("order_by", "order_by", &["name", "size", "lastModifiedDateTime"]),
            FormItem::select("order_direction", "order_direction", &["asc", "desc"]),
        ]
    }

    fn prepare(&self, account: &mut Account) -> Result<()> {
        host::account_zone(account)?;
        match account.onedrive_type.as_str() {
            "onedrive" => {}
            "sharepoint" if account.site_id.is_empty() => {
                return Err(DriveError::InvalidAccount(
                    "site id is required for sharepoint".to_string(),
                ))
            }
            "sharepoint" => {}
            other => {
                return Err(DriveError::InvalidAccount(format!(
                    "unknown onedrive type '{}'",
                    other
                )))
            }
        }
        if account.refresh_token.is_empty() {
            return Err(DriveError::InvalidAccount(
                "refresh token is required".to_string(),
            ));
        }
        account.root_folder = path::normalize(&account.root_folder);
        Ok(())
    }

    async fn file(&self, account: &str, path: &str) -> Result<File> {
        self.ctx.file(account, path).await
    }

    async fn files(&self, account: &str, path: &str) -> Result<Vec<File>> {
        self.ctx.files(account, path).await
    }

    /// Download URLs in listings expire within the hour, so the link asks
    /// Graph for a fresh one.
    #[instrument(skip(self))]
    async fn link(&self, account: &str, path: &str) -> Result<String> {
        let (snapshot, item) = self.ctx.link_target(account, path).await?;
        let api = self.api();

        let reply = with_refresh(
            snapshot,
            INVALID_AUTHENTICATION_TOKEN,
            |acc| {
                let item = &item;
                async move { api.item(&acc, item).await }
            },
            |acc| async move { self.ctx.refresh(&acc, api).await },
        )
        .await?;

        if reply.data.download_url.is_empty() {
            return Err(DriveError::Decode(format!(
                "no download url for {}",
                path::normalize(path)
            )));
        }
        Ok(reply.data.download_url)
    }

    fn proxy_headers(&self, _account: &Account) -> ProxyHeaders {
        ProxyHeaders::default().remove("Origin")
    }

    fn invalidate(&self, account: &str, path: &str) -> usize {
        self.ctx.invalidate(account, path)
    }
}
