//! AliDrive wire types

use chrono::{DateTime, Utc};
use core_drive::{ApiResponse, FileCategory, NativeEntry, FOLDER_SIZE};
use serde::{Deserialize, Serialize};

/// Error code of an expired access token
pub const ACCESS_TOKEN_INVALID: &str = "AccessTokenInvalid";

/// Lifetime requested for signed URLs, in seconds
pub const URL_EXPIRE_SEC: u32 = 14400;

/// Largest page the listing endpoint accepts
pub const MAX_LIMIT: u32 = 200;

/// Successful replies carry the payload at the top level; failures carry
/// only `code` and `message`.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse for Reply<T> {
    fn is_success(&self) -> bool {
        self.code.is_empty()
    }

    fn error_code(&self) -> String {
        self.code.clone()
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }

    fn clear_code(&mut self) {
        self.code.clear();
    }
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub refresh_token: &'a str,
    pub grant_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenData {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub default_drive_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub default_drive_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListRequest<'a> {
    pub drive_id: &'a str,
    pub fields: &'static str,
    pub image_thumbnail_process: &'static str,
    pub image_url_process: &'static str,
    pub limit: u32,
    pub marker: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub order_by: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub order_direction: &'a str,
    pub parent_file_id: &'a str,
    pub video_thumbnail_process: &'static str,
    pub url_expire_sec: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<AliFile>,
    #[serde(default)]
    pub next_marker: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AliFile {
    #[serde(default)]
    pub drive_id: String,
    pub file_id: String,
    pub name: String,
    /// `file` or `folder`
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub parent_file_id: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
}

impl NativeEntry for AliFile {
    fn native_id(&self) -> &str {
        &self.file_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_size(&self) -> i64 {
        if self.r#type == "folder" {
            FOLDER_SIZE
        } else {
            self.size
        }
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn thumbnail(&self) -> Option<&str> {
        Some(self.thumbnail.as_str())
    }

    fn url(&self) -> Option<&str> {
        Some(self.url.as_str())
    }

    fn category_hint(&self) -> Option<FileCategory> {
        match self.category.as_str() {
            "video" => Some(FileCategory::Video),
            "image" => Some(FileCategory::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DownloadRequest<'a> {
    pub drive_id: &'a str,
    pub file_id: &'a str,
    pub expire_sec: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadUrl {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewRequest<'a> {
    pub drive_id: &'a str,
    pub file_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
}
