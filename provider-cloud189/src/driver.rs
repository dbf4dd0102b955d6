//! 189 Cloud driver

use async_trait::async_trait;
use bridge_traits::Account;
use core_auth::{Authenticator, Credentials};
use core_drive::{
    with_refresh, Driver, DriverConfig, DriverContext, DriverDeps, DriveError, File, FormItem,
    ProxyHeaders, Result,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::{Cloud189Api, DRIVER_NAME};
use crate::types::INVALID_SESSION_KEY;

/// Driver for 189 Cloud (cloud.189.cn) password accounts.
pub struct Cloud189Driver {
    ctx: DriverContext<Cloud189Api>,
}

impl Cloud189Driver {
    pub fn new(deps: DriverDeps) -> Self {
        let api = Cloud189Api::new(deps.http.clone(), deps.retry.clone(), deps.auth.clone());
        Self {
            ctx: DriverContext::new(deps, Arc::new(api)),
        }
    }

    pub fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self::new(deps))
    }

    fn api(&self) -> &Cloud189Api {
        self.ctx.source()
    }
}

#[async_trait]
impl Authenticator for Cloud189Driver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.api().authenticate(account).await
    }
}

#[async_trait]
impl Driver for Cloud189Driver {
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
            FormItem::string("root_folder", "root folder file_id").required(),
            FormItem::select(
                "order_by",
                "order_by",
                &["name", "size", "lastOpTime", "createdDate"],
            )
            .required(),
            FormItem::select("order_direction", "desc", &["true", "false"]).required(),
        ]
    }

    fn prepare(&self, account: &mut Account) -> Result<()> {
        if account.username.is_empty() || account.password.is_empty() {
            return Err(DriveError::InvalidAccount(
                "username and password are required".to_string(),
            ));
        }
        if account.root_folder.is_empty() {
            return Err(DriveError::InvalidAccount(
                "root folder file_id is required".to_string(),
            ));
        }
        if account.order_by.is_empty() {
            account.order_by = "name".to_string();
        }
        if account.order_direction.is_empty() {
            account.order_direction = "false".to_string();
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
            INVALID_SESSION_KEY,
            |acc| {
                let file = &file;
                async move { api.download_url(&acc, file).await }
            },
            |acc| async move { self.ctx.refresh(&acc, api).await },
        )
        .await?;

        if reply.data.file_download_url.is_empty() {
            return Err(DriveError::Decode(
                "getFileDownloadUrl without fileDownloadUrl".to_string(),
            ));
        }
        api.resolve_redirect(&reply.data.file_download_url).await
    }

    fn proxy_headers(&self, _account: &Account) -> ProxyHeaders {
        ProxyHeaders::default().remove("Origin")
    }

    fn invalidate(&self, account: &str, path: &str) -> usize {
        self.ctx.invalidate(account, path)
    }

    fn forget_account(&self, account: &str) {
        self.api().forget(account);
        self.ctx.invalidate(account, "/");
    }
}
