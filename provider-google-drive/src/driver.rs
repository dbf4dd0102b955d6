//! Google Drive driver

use async_trait::async_trait;
use bridge_traits::Account;
use core_auth::{Authenticator, Credentials};
use core_drive::{
    with_refresh, Driver, DriverConfig, DriverContext, DriverDeps, DriveError, File, FormItem,
    ProxyHeaders, Result,
};
use std::sync::Arc;
use tracing::instrument;

use crate::connector::{GoogleDriveConnector, DRIVER_NAME};
use crate::types::CODE_UNAUTHENTICATED;

/// Driver for Google Drive OAuth accounts.
///
/// Google does not serve file bodies to anonymous clients, so every
/// download goes through the proxy with the account's bearer token.
pub struct GoogleDriveDriver {
    ctx: DriverContext<GoogleDriveConnector>,
}

impl GoogleDriveDriver {
    pub fn new(deps: DriverDeps) -> Self {
        let connector =
            GoogleDriveConnector::new(deps.http.clone(), deps.retry.clone(), deps.auth.clone());
        Self {
            ctx: DriverContext::new(deps, Arc::new(connector)),
        }
    }

    pub fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self::new(deps))
    }

    fn connector(&self) -> &GoogleDriveConnector {
        self.ctx.source()
    }
}

#[async_trait]
impl Authenticator for GoogleDriveDriver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.connector().authenticate(account).await
    }
}

#[async_trait]
impl Driver for GoogleDriveDriver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: DRIVER_NAME,
            only_proxy: true,
            local_sort: false,
        }
    }

    fn items(&self) -> Vec<FormItem> {
        vec![
            FormItem::string("client_id", "client id").required(),
            FormItem::string("client_secret", "client secret").required(),
            FormItem::string("refresh_token", "refresh token").required(),
            FormItem::string("root_folder", "root folder file_id"),
        ]
    }

    fn prepare(&self, account: &mut Account) -> Result<()> {
        if account.client_id.is_empty()
            || account.client_secret.is_empty()
            || account.refresh_token.is_empty()
        {
            return Err(DriveError::InvalidAccount(
                "client id, client secret and refresh token are required".to_string(),
            ));
        }
        if account.root_folder.is_empty() {
            account.root_folder = "root".to_string();
        }
        account.proxy = true;
        Ok(())
    }

    async fn file(&self, account: &str, path: &str) -> Result<File> {
        self.ctx.file(account, path).await
    }

    async fn files(&self, account: &str, path: &str) -> Result<Vec<File>> {
        self.ctx.files(account, path).await
    }

    /// Checks the token against the file's metadata and returns the media
    /// URL. The URL only works with an `Authorization` header.
    #[instrument(skip(self))]
    async fn link(&self, account: &str, path: &str) -> Result<String> {
        let (snapshot, file) = self.ctx.link_target(account, path).await?;
        let connector = self.connector();

        with_refresh(
            snapshot,
            CODE_UNAUTHENTICATED,
            |acc| {
                let file = &file;
                async move { connector.get_metadata(&acc, file).await }
            },
            |acc| async move { self.ctx.refresh(&acc, connector).await },
        )
        .await?;

        Ok(GoogleDriveConnector::media_url(&file))
    }

    fn proxy_headers(&self, account: &Account) -> ProxyHeaders {
        ProxyHeaders::default().set(
            "Authorization",
            format!("Bearer {}", account.access_token),
        )
    }

    fn invalidate(&self, account: &str, path: &str) -> usize {
        self.ctx.invalidate(account, path)
    }
}
