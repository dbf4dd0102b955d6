//! Common File Model
//!
//! Every provider's native record is mapped into [`File`] before it leaves
//! a driver. Native records implement [`NativeEntry`]; the normalizer reads
//! them field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Size sentinel marking a native record as a folder.
pub const FOLDER_SIZE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Folder,
}

/// Coarse grouping used by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Unknown,
    Folder,
    Office,
    Video,
    Audio,
    Text,
    Image,
}

const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ape", "wav", "m4a", "ogg", "aac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "rmvb", "webm", "flv", "m3u8"];
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "htm", "html", "xml", "java", "properties", "sql", "js", "md", "json", "conf", "ini",
    "vue", "php", "py", "bat", "gitignore", "yml", "go", "sh", "c", "cpp", "h", "hpp",
];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "tiff", "jpeg", "png", "gif", "bmp", "svg", "ico", "swf", "webp",
];

impl FileCategory {
    /// Category of a file name by its lower-cased extension.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
            _ => return FileCategory::Unknown,
        };
        let ext = ext.as_str();

        if OFFICE_EXTENSIONS.contains(&ext) {
            FileCategory::Office
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileCategory::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileCategory::Video
        } else if TEXT_EXTENSIONS.contains(&ext) {
            FileCategory::Text
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            FileCategory::Image
        } else {
            FileCategory::Unknown
        }
    }
}

/// Provider-agnostic file or folder.
///
/// `id` is only meaningful together with the account that produced it.
/// Folders always report `size == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub category: FileCategory,
    pub driver: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
}

impl File {
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }

    /// A virtual folder, used for mount points.
    pub fn folder(name: impl Into<String>, driver: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            size: 0,
            file_type: FileType::Folder,
            category: FileCategory::Folder,
            driver: driver.into(),
            updated_at: None,
            thumbnail: None,
            url: None,
        }
    }
}

/// A provider's native listing record.
pub trait NativeEntry: Clone + Send + Sync + 'static {
    fn native_id(&self) -> &str;

    fn name(&self) -> &str;

    /// Byte size, or [`FOLDER_SIZE`] for folders
    fn raw_size(&self) -> i64;

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn thumbnail(&self) -> Option<&str> {
        None
    }

    fn url(&self) -> Option<&str> {
        None
    }

    /// Provider-declared category that overrides the extension guess
    fn category_hint(&self) -> Option<FileCategory> {
        None
    }

    fn is_folder(&self) -> bool {
        self.raw_size() == FOLDER_SIZE
    }
}

pub fn normalize<E: NativeEntry>(entry: &E, driver: &str) -> File {
    let folder = entry.is_folder();
    let category = if folder {
        FileCategory::Folder
    } else {
        entry
            .category_hint()
            .unwrap_or_else(|| FileCategory::from_name(entry.name()))
    };

    File {
        id: entry.native_id().to_string(),
        name: entry.name().to_string(),
        size: if folder {
            0
        } else {
            u64::try_from(entry.raw_size()).unwrap_or(0)
        },
        file_type: if folder {
            FileType::Folder
        } else {
            FileType::File
        },
        category,
        driver: driver.to_string(),
        updated_at: entry.updated_at(),
        thumbnail: entry.thumbnail().filter(|t| !t.is_empty()).map(str::to_string),
        url: entry.url().filter(|u| !u.is_empty()).map(str::to_string),
    }
}

pub fn normalize_all<E: NativeEntry>(entries: &[E], driver: &str) -> Vec<File> {
    entries.iter().map(|entry| normalize(entry, driver)).collect()
}

/// Deserializes an id that providers send either as a JSON string or a
/// number.
pub fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::Entry;
    use super::*;

    #[test]
    fn test_folder_size_is_reported_as_zero() {
        let file = normalize(&Entry::folder("1", "photos.jpg"), "123Pan");

        assert_eq!(file.file_type, FileType::Folder);
        assert_eq!(file.size, 0);
        assert_eq!(file.category, FileCategory::Folder);
    }

    #[test]
    fn test_file_category_from_extension() {
        let file = normalize(&Entry::file("2", "Report.PDF", 1024), "123Pan");

        assert_eq!(file.file_type, FileType::File);
        assert_eq!(file.size, 1024);
        assert_eq!(file.category, FileCategory::Office);
        assert_eq!(file.driver, "123Pan");
    }

    #[test]
    fn test_categories() {
        assert_eq!(FileCategory::from_name("song.flac"), FileCategory::Audio);
        assert_eq!(FileCategory::from_name("clip.mkv"), FileCategory::Video);
        assert_eq!(FileCategory::from_name("main.go"), FileCategory::Text);
        assert_eq!(FileCategory::from_name("a.webp"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("README"), FileCategory::Unknown);
        assert_eq!(FileCategory::from_name("archive."), FileCategory::Unknown);
    }

    #[derive(Clone)]
    struct Hinted;

    impl NativeEntry for Hinted {
        fn native_id(&self) -> &str {
            "h"
        }
        fn name(&self) -> &str {
            "movie.bin"
        }
        fn raw_size(&self) -> i64 {
            10
        }
        fn category_hint(&self) -> Option<FileCategory> {
            Some(FileCategory::Video)
        }
        fn thumbnail(&self) -> Option<&str> {
            Some("")
        }
    }

    #[derive(Deserialize)]
    struct WithId {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let numeric: WithId = serde_json::from_str(r#"{"id": 1234567890123}"#).unwrap();
        let text: WithId = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(numeric.id, "1234567890123");
        assert_eq!(text.id, "abc");
    }

    #[test]
    fn test_category_hint_overrides_extension() {
        let file = normalize(&Hinted, "AliDrive");
        assert_eq!(file.category, FileCategory::Video);
        assert_eq!(file.thumbnail, None);
    }
}
