//! 189 Cloud wire types

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use core_drive::{deserialize_id, ApiResponse, NativeEntry, FOLDER_SIZE};
use serde::{Deserialize, Deserializer, Serialize};

/// Error code of a dead session cookie
pub const INVALID_SESSION_KEY: &str = "InvalidSessionKey";

/// `lastOpTime` layout; the service reports China Standard Time
pub const OP_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CST_OFFSET_SECS: i32 = 8 * 3600;

/// Common reply shape of the `api/open` endpoints.
///
/// Business failures carry `res_code`/`res_message`; gateway failures
/// (including an expired session) carry `errorCode`/`errorMsg` instead.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
    #[serde(default)]
    pub res_code: i64,
    #[serde(default)]
    pub res_message: String,
    #[serde(default, rename = "errorCode")]
    pub error_code: String,
    #[serde(default, rename = "errorMsg")]
    pub error_msg: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse for Reply<T> {
    fn is_success(&self) -> bool {
        self.error_code.is_empty() && self.res_code == 0
    }

    fn error_code(&self) -> String {
        if self.error_code.is_empty() {
            self.res_code.to_string()
        } else {
            self.error_code.clone()
        }
    }

    fn error_message(&self) -> String {
        if self.error_code.is_empty() {
            self.res_message.clone()
        } else {
            self.error_msg.clone()
        }
    }

    fn clear_code(&mut self) {
        self.error_code.clear();
        self.res_code = 0;
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListData {
    #[serde(default, rename = "fileListAO")]
    pub file_list_ao: Option<FileListAo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListAo {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub file_list: Vec<Cloud189File>,
    #[serde(default)]
    pub folder_list: Vec<Cloud189File>,
}

impl FileListAo {
    /// Files first, then folders (flagged), as one page of entries.
    pub fn into_entries(self) -> Vec<Cloud189File> {
        let mut entries = self.file_list;
        entries.extend(self.folder_list.into_iter().map(|mut folder| {
            folder.folder = true;
            folder
        }));
        entries
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    #[serde(default)]
    pub small_url: String,
}

/// One entry of `fileList` or `folderList`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloud189File {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, deserialize_with = "deserialize_op_time")]
    pub last_op_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub icon: Option<Icon>,
    #[serde(default)]
    pub url: String,
    #[serde(skip)]
    pub folder: bool,
}

impl NativeEntry for Cloud189File {
    fn native_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_size(&self) -> i64 {
        if self.folder {
            FOLDER_SIZE
        } else {
            self.size
        }
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_op_time
    }

    fn thumbnail(&self) -> Option<&str> {
        self.icon
            .as_ref()
            .map(|icon| icon.small_url.as_str())
            .filter(|url| !url.is_empty())
    }

    fn url(&self) -> Option<&str> {
        Some(self.url.as_str()).filter(|url| !url.is_empty())
    }
}

/// Parses a `lastOpTime` value. Unparseable values become `None`.
pub fn parse_op_time(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), OP_TIME_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(CST_OFFSET_SECS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|time| time.with_timezone(&Utc))
}

fn deserialize_op_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_op_time))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadData {
    #[serde(default)]
    pub file_download_url: String,
}

/// Fields of `loginSubmit.do`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm<'a> {
    pub app_key: &'static str,
    pub account_type: &'static str,
    pub user_name: &'a str,
    pub password: &'a str,
    pub validate_code: &'static str,
    pub captcha_token: &'a str,
    pub return_url: &'a str,
    pub mail_suffix: &'static str,
    pub param_id: &'a str,
    pub client_type: &'static str,
    pub dynamic_check: &'static str,
    #[serde(rename = "cb_SaveName")]
    pub cb_save_name: &'static str,
    pub is_oauth2: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub result: i64,
    #[serde(default)]
    pub to_url: String,
}
