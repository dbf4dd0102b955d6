//! National cloud endpoints and drive addressing.

use bridge_traits::Account;
use core_drive::{path, DriveError, Result};

/// Login and Graph hosts of one national cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub oauth: &'static str,
    pub api: &'static str,
}

pub const ZONE_NAMES: &[&str] = &["global", "cn", "us", "de"];

pub fn zone(name: &str) -> Option<Zone> {
    let zone = match name {
        "global" => Zone {
            oauth: "https://login.microsoftonline.com",
            api: "https://graph.microsoft.com",
        },
        "cn" => Zone {
            oauth: "https://login.chinacloudapi.cn",
            api: "https://microsoftgraph.chinacloudapi.cn",
        },
        "us" => Zone {
            oauth: "https://login.microsoftonline.us",
            api: "https://graph.microsoft.us",
        },
        "de" => Zone {
            oauth: "https://login.microsoftonline.de",
            api: "https://graph.microsoft.de",
        },
        _ => return None,
    };
    Some(zone)
}

pub fn account_zone(account: &Account) -> Result<Zone> {
    zone(&account.zone)
        .ok_or_else(|| DriveError::InvalidAccount(format!("no [{}] zone", account.zone)))
}

/// Token endpoint of the account's zone.
pub fn token_url(account: &Account) -> Result<String> {
    Ok(format!(
        "{}/common/oauth2/v2.0/token",
        account_zone(account)?.oauth
    ))
}

/// `.../v1.0/me/drive` or `.../v1.0/sites/{site_id}/drive`
pub fn drive_base(account: &Account) -> Result<String> {
    let api = account_zone(account)?.api;
    match account.onedrive_type.as_str() {
        "onedrive" => Ok(format!("{}/v1.0/me/drive", api)),
        "sharepoint" => Ok(format!("{}/v1.0/sites/{}/drive", api, account.site_id)),
        other => Err(DriveError::InvalidAccount(format!(
            "unknown onedrive type '{}'",
            other
        ))),
    }
}

/// Drive item of the mount root, addressed by the configured folder path.
pub fn root_item(account: &Account) -> Result<String> {
    let base = drive_base(account)?;
    let root = path::normalize(&account.root_folder);
    if path::is_root(&root) {
        return Ok(format!("{}/root", base));
    }
    let encoded: Vec<String> = root
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    Ok(format!("{}/root:{}:", base, encoded.join("/")))
}
