//! 123Pan driver

use async_trait::async_trait;
use bridge_traits::Account;
use core_auth::{Authenticator, Credentials};
use core_drive::{
    with_refresh, Driver, DriverConfig, DriverContext, DriverDeps, DriveError, File, FormItem,
    ProxyHeaders, Result,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::{Pan123Api, DRIVER_NAME};
use crate::types::CODE_TOKEN_EXPIRED;

/// Driver for 123Pan password accounts.
///
/// Logs in with passport and password to obtain a bearer token. Listings
/// page through `file/list` with the `Next` cursor and are sorted by the
/// server using the account's ordering.
pub struct Pan123Driver {
    ctx: DriverContext<Pan123Api>,
}

impl Pan123Driver {
    pub fn new(deps: DriverDeps) -> Self {
        let api = Pan123Api::new(deps.http.clone(), deps.retry.clone(), deps.auth.clone());
        Self {
            ctx: DriverContext::new(deps, Arc::new(api)),
        }
    }

    pub fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self::new(deps))
    }

    fn api(&self) -> &Pan123Api {
        self.ctx.source()
    }
}

#[async_trait]
impl Authenticator for Pan123Driver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.api().authenticate(account).await
    }
}

#[async_trait]
impl Driver for Pan123Driver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: DRIVER_NAME,
            only_proxy: false,
            local_sort: false,
        }
    }

    fn items(&self) -> Vec<FormItem> {
        vec![
            FormItem::string("username", "username")
                .required()
                .describe("account username/phone number"),
            FormItem::string("password", "password")
                .required()
                .describe("account password"),
            FormItem::string("root_folder", "root folder file_id"),
            FormItem::select(
                "order_by",
                "order_by",
                &["name", "fileId", "updateAt", "createAt"],
            )
            .required(),
            FormItem::select("order_direction", "order_direction", &["asc", "desc"]).required(),
        ]
    }

    fn prepare(&self, account: &mut Account) -> Result<()> {
        if account.username.is_empty() || account.password.is_empty() {
            return Err(DriveError::InvalidAccount(
                "username and password are required".to_string(),
            ));
        }
        if account.root_folder.is_empty() {
            account.root_folder = "0".to_string();
        }
        if account.order_by.is_empty() {
            account.order_by = "name".to_string();
        }
        if account.order_direction.is_empty() {
            account.order_direction = "asc".to_string();
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

        let info = with_refresh(
            snapshot,
            CODE_TOKEN_EXPIRED,
            |acc| {
                let file = &file;
                async move { api.download_info(&acc, file).await }
            },
            |acc| async move { self.ctx.refresh(&acc, api).await },
        )
        .await?;

        let download_url = info
            .data
            .map(|d| d.download_url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DriveError::Decode("download_info without DownloadUrl".to_string()))?;
        api.resolve_redirect(&download_url).await
    }

    fn proxy_headers(&self, _account: &Account) -> ProxyHeaders {
        ProxyHeaders::default().remove("Origin")
    }

    fn invalidate(&self, account: &str, path: &str) -> usize {
        self.ctx.invalidate(account, path)
    }
}
