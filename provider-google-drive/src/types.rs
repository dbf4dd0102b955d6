//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use chrono::{DateTime, Utc};
use core_drive::{ApiResponse, NativeEntry, FOLDER_SIZE};
use serde::{Deserialize, Serialize};

/// HTTP status Google reports for an expired access token
pub const CODE_UNAUTHENTICATED: &str = "401";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Shortcuts are listed as folders
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    #[serde(default)]
    pub mime_type: String,

    /// File size in bytes, as a decimal string (omitted for folders)
    #[serde(default)]
    pub size: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

impl DriveFile {
    pub fn is_dir(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE || self.mime_type == SHORTCUT_MIME_TYPE
    }
}

impl NativeEntry for DriveFile {
    fn native_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_size(&self) -> i64 {
        if self.is_dir() {
            return FOLDER_SIZE;
        }
        self.size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.modified_time
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// `error` object of a failed call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<GoogleErrorItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleErrorItem {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

/// A v3 reply: the payload, or an `error` object.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
    #[serde(default)]
    pub error: Option<GoogleError>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse for Reply<T> {
    fn is_success(&self) -> bool {
        self.error.as_ref().map_or(true, |e| e.code == 0)
    }

    fn error_code(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.code.to_string())
            .unwrap_or_default()
    }

    fn error_message(&self) -> String {
        let Some(error) = &self.error else {
            return String::new();
        };
        let reasons: Vec<&str> = error
            .errors
            .iter()
            .map(|item| item.reason.as_str())
            .filter(|reason| !reason.is_empty())
            .collect();
        if reasons.is_empty() {
            error.message.clone()
        } else {
            format!("{}: {}", error.message, reasons.join(", "))
        }
    }

    fn clear_code(&mut self) {
        self.error = None;
    }
}

/// Form body of the refresh-token grant
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub refresh_token: &'a str,
    pub grant_type: &'static str,
}

/// OAuth token endpoint reply; failures carry `error`
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_drive::normalize;

    #[test]
    fn test_deserialize_drive_file() {
        let json = r#"{
            "id": "abc123",
            "name": "test.mp3",
            "mimeType": "audio/mpeg",
            "size": "1024",
            "modifiedTime": "2023-01-02T00:00:00.000Z"
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.raw_size(), 1024);
        assert!(file.modified_time.is_some());
        assert!(!file.is_dir());
    }

    #[test]
    fn test_shortcut_is_folder() {
        let json = r#"{"id": "s", "name": "link", "mimeType": "application/vnd.google-apps.shortcut"}"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();

        let normalized = normalize(&file, "GoogleDrive");
        assert!(normalized.is_folder());
        assert_eq!(normalized.size, 0);
    }

    #[test]
    fn test_deserialize_files_list_response() {
        let json = r#"{
            "files": [{"id": "file1", "name": "song1.mp3", "mimeType": "audio/mpeg"}],
            "nextPageToken": "token123"
        }"#;

        let response: Reply<FilesListResponse> = serde_json::from_str(json).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data.files.len(), 1);
        assert_eq!(response.data.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_error_reply() {
        let json = r#"{"error": {"code": 401, "message": "Invalid Credentials",
                       "errors": [{"domain": "global", "reason": "authError"}]}}"#;

        let response: Reply<FilesListResponse> = serde_json::from_str(json).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.error_code(), CODE_UNAUTHENTICATED);
        assert_eq!(response.error_message(), "Invalid Credentials: authError");
    }
}
