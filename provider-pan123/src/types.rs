//! 123Pan wire types

use chrono::{DateTime, Utc};
use core_drive::{deserialize_id, ApiResponse, NativeEntry, FOLDER_SIZE};
use serde::{Deserialize, Serialize};

/// `code` value of a successful `file/*` call
pub const CODE_OK: i64 = 0;

/// `code` value of a successful `user/sign_in`
pub const SIGN_IN_OK: i64 = 200;

/// Access-token-invalid sentinel
pub const CODE_TOKEN_EXPIRED: &str = "401";

/// `Next` value on the last page
pub const LAST_PAGE: &str = "-1";

/// Generic `{code, message, data}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse for Envelope<T> {
    fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    fn error_code(&self) -> String {
        self.code.to_string()
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }

    fn clear_code(&mut self) {
        self.code = CODE_OK;
    }
}

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub passport: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileList {
    #[serde(default)]
    pub info_list: Vec<Pan123File>,
    #[serde(default)]
    pub next: String,
}

/// 1 marks a folder
pub const TYPE_FOLDER: i32 = 1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pan123File {
    #[serde(deserialize_with = "deserialize_id")]
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub update_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub r#type: i32,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub s3_key_flag: String,
}

impl NativeEntry for Pan123File {
    fn native_id(&self) -> &str {
        &self.file_id
    }

    fn name(&self) -> &str {
        &self.file_name
    }

    fn raw_size(&self) -> i64 {
        if self.r#type == TYPE_FOLDER {
            FOLDER_SIZE
        } else {
            self.size
        }
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.update_at
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInfoRequest<'a> {
    pub drive_id: i64,
    pub etag: &'a str,
    pub file_id: i64,
    pub file_name: &'a str,
    #[serde(rename = "s3keyFlag")]
    pub s3_key_flag: &'a str,
    pub size: i64,
    pub r#type: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadInfo {
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_list_decoding() {
        let body = r#"{
            "code": 0,
            "message": "ok",
            "data": {
                "Next": "-1",
                "InfoList": [
                    {"FileId": 11, "FileName": "docs", "Size": 0, "Type": 1,
                     "UpdateAt": "2021-11-20T15:50:12+08:00"},
                    {"FileId": 12, "FileName": "a.mp4", "Size": 2048, "Type": 0,
                     "Etag": "e", "S3KeyFlag": "k"}
                ]
            }
        }"#;

        let resp: Envelope<FileList> = serde_json::from_str(body).unwrap();
        let list = resp.data.unwrap();

        assert_eq!(list.next, "-1");
        assert_eq!(list.info_list[0].raw_size(), FOLDER_SIZE);
        assert!(list.info_list[0].update_at.is_some());
        assert_eq!(list.info_list[1].native_id(), "12");
        assert_eq!(list.info_list[1].raw_size(), 2048);
        assert_eq!(list.info_list[1].s3_key_flag, "k");
    }

    #[test]
    fn test_download_request_field_names() {
        let body = serde_json::to_value(DownloadInfoRequest {
            drive_id: 0,
            etag: "e",
            file_id: 12,
            file_name: "a.mp4",
            s3_key_flag: "k",
            size: 2048,
            r#type: 0,
        })
        .unwrap();

        assert_eq!(body["s3keyFlag"], "k");
        assert_eq!(body["fileId"], 12);
        assert_eq!(body["driveId"], 0);
    }
}
