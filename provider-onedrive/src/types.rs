//! Microsoft Graph wire types

use chrono::{DateTime, Utc};
use core_drive::{ApiResponse, NativeEntry, FOLDER_SIZE};
use serde::{Deserialize, Serialize};

/// Graph error code of an expired access token
pub const INVALID_AUTHENTICATION_TOKEN: &str = "InvalidAuthenticationToken";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A Graph reply: the payload, or an `error` object.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
    #[serde(default)]
    pub error: Option<GraphError>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse for Reply<T> {
    fn is_success(&self) -> bool {
        self.error.as_ref().map_or(true, |e| e.code.is_empty())
    }

    fn error_code(&self) -> String {
        self.error.as_ref().map(|e| e.code.clone()).unwrap_or_default()
    }

    fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_default()
    }

    fn clear_code(&mut self) {
        self.error = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: String,
}

/// A drive item; folders carry no `file` facet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub last_modified_date_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "@microsoft.graph.downloadUrl")]
    pub download_url: String,
    #[serde(default)]
    pub file: Option<FileFacet>,
}

impl NativeEntry for DriveItem {
    fn native_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_size(&self) -> i64 {
        if self.file.is_none() {
            FOLDER_SIZE
        } else {
            self.size
        }
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified_date_time
    }

    fn url(&self) -> Option<&str> {
        Some(self.download_url.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Children {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(default, rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Single item lookup; only the fields a link needs.
#[derive(Debug, Default, Deserialize)]
pub struct ItemLink {
    #[serde(default, rename = "@microsoft.graph.downloadUrl")]
    pub download_url: String,
    #[serde(default)]
    pub file: Option<FileFacet>,
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub refresh_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}
