//! Post-processing of normalized listings: ordering, folder placement,
//! the password marker and page slicing.

use std::cmp::Ordering;

use crate::error::{DriveError, Result};
use crate::models::File;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One configured ordering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parses an account's `order_by` / `order_direction` pair.
    ///
    /// Provider-native field names are accepted. An empty or unknown field
    /// yields `None`, which leaves listings in provider order.
    pub fn parse(order_by: &str, direction: &str) -> Option<Self> {
        let field = match order_by.trim().to_ascii_lowercase().as_str() {
            "name" | "file_name" | "filename" => SortField::Name,
            "size" | "file_size" => SortField::Size,
            "updated_at" | "modified" | "modified_at" | "modifiedtime" | "lastoptime"
            | "updateat" | "lastmodifieddatetime" | "time" => SortField::Modified,
            _ => return None,
        };
        let direction = if direction.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Some(Self { field, direction })
    }

    fn compare(&self, a: &File, b: &File) -> Ordering {
        let ordering = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size => a.size.cmp(&b.size),
            // None sorts before Some: a missing timestamp counts as oldest
            SortField::Modified => a.updated_at.cmp(&b.updated_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Stable sort; `None` keeps the input order.
pub fn sort_files(files: &mut [File], order: Option<SortOrder>) {
    if let Some(order) = order {
        files.sort_by(|a, b| order.compare(a, b));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderPlacement {
    #[default]
    Front,
    Back,
}

impl FolderPlacement {
    /// Parses an account's `extract_folder`; empty or unknown values keep
    /// provider order.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => Some(FolderPlacement::Front),
            "back" => Some(FolderPlacement::Back),
            _ => None,
        }
    }
}

/// Moves folders to one end, keeping relative order on both sides.
pub fn extract_folders(files: Vec<File>, placement: FolderPlacement) -> Vec<File> {
    let (folders, others): (Vec<File>, Vec<File>) = files.into_iter().partition(File::is_folder);
    match placement {
        FolderPlacement::Front => folders.into_iter().chain(others).collect(),
        FolderPlacement::Back => others.into_iter().chain(folders).collect(),
    }
}

/// Removes the first entry named `<prefix><password>` and returns the
/// remaining files plus the password it carried.
pub fn password_gate(files: Vec<File>, prefix: &str) -> (Vec<File>, Option<String>) {
    let mut password = None;
    let visible = files
        .into_iter()
        .filter(|file| {
            if password.is_none() {
                if let Some(rest) = file.name.strip_prefix(prefix) {
                    password = Some(rest.to_string());
                    return false;
                }
            }
            true
        })
        .collect();
    (visible, password)
}

/// Slices one page out of a listing.
///
/// `page_num` starts at 1. `0/0` returns everything; a page past the end is
/// empty.
pub fn paginate(files: Vec<File>, page_num: usize, page_size: usize) -> Result<Vec<File>> {
    if page_num == 0 && page_size == 0 {
        return Ok(files);
    }
    if page_num < 1 {
        return Err(DriveError::InvalidRequest(
            "page_num can't be less than 1".to_string(),
        ));
    }

    let start = (page_num - 1).saturating_mul(page_size);
    Ok(files.into_iter().skip(start).take(page_size).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileCategory, FileType};
    use chrono::{TimeZone, Utc};

    fn file(name: &str, size: u64) -> File {
        File {
            id: name.to_string(),
            name: name.to_string(),
            size,
            file_type: FileType::File,
            category: FileCategory::from_name(name),
            driver: "Test".to_string(),
            updated_at: None,
            thumbnail: None,
            url: None,
        }
    }

    fn names(files: &[File]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_sort_by_name_desc() {
        let mut files = vec![file("b", 0), file("a", 0), file("c", 0)];
        sort_files(&mut files, SortOrder::parse("name", "desc"));
        assert_eq!(names(&files), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_by_size_asc() {
        let mut files = vec![file("x", 30), file("y", 10), file("z", 20)];
        sort_files(&mut files, SortOrder::parse("size", "asc"));
        let sizes: Vec<u64> = files.iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![10, 20, 30]);
    }

    #[test]
    fn test_no_order_keeps_input() {
        let mut files = vec![file("b", 0), file("a", 0), file("c", 0)];
        sort_files(&mut files, SortOrder::parse("", ""));
        assert_eq!(names(&files), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_timestamp_is_oldest() {
        let mut old = file("old", 0);
        old.updated_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let mut new = file("new", 0);
        new.updated_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let unknown = file("unknown", 0);

        let mut files = vec![new.clone(), unknown.clone(), old.clone()];
        sort_files(&mut files, SortOrder::parse("lastOpTime", "asc"));
        assert_eq!(names(&files), vec!["unknown", "old", "new"]);

        sort_files(&mut files, SortOrder::parse("updated_at", "DESC"));
        assert_eq!(names(&files), vec!["new", "old", "unknown"]);
    }

    #[test]
    fn test_parse_native_field_names() {
        assert_eq!(
            SortOrder::parse("modifiedTime", ""),
            Some(SortOrder::new(SortField::Modified, SortDirection::Asc))
        );
        assert_eq!(
            SortOrder::parse("file_name", "desc"),
            Some(SortOrder::new(SortField::Name, SortDirection::Desc))
        );
        assert_eq!(SortOrder::parse("colour", "asc"), None);
    }

    #[test]
    fn test_extract_folders_is_stable() {
        let mut d1 = file("d1", 0);
        d1.file_type = FileType::Folder;
        let mut d2 = file("d2", 0);
        d2.file_type = FileType::Folder;
        let files = vec![file("f1", 1), d1, file("f2", 2), d2];

        let front = extract_folders(files.clone(), FolderPlacement::Front);
        assert_eq!(names(&front), vec!["d1", "d2", "f1", "f2"]);

        let back = extract_folders(files, FolderPlacement::Back);
        assert_eq!(names(&back), vec!["f1", "f2", "d1", "d2"]);
    }

    #[test]
    fn test_parse_folder_placement() {
        assert_eq!(FolderPlacement::parse("front"), Some(FolderPlacement::Front));
        assert_eq!(FolderPlacement::parse(" Back "), Some(FolderPlacement::Back));
        assert_eq!(FolderPlacement::parse(""), None);
        assert_eq!(FolderPlacement::parse("middle"), None);
    }

    #[test]
    fn test_password_gate() {
        let files = vec![file("a.txt", 1), file(".password-xhf", 0), file("b.txt", 2)];

        let (visible, password) = password_gate(files, ".password-");

        assert_eq!(names(&visible), vec!["a.txt", "b.txt"]);
        assert_eq!(password.as_deref(), Some("xhf"));
    }

    #[test]
    fn test_password_gate_unprotected() {
        let (visible, password) = password_gate(vec![file("a.txt", 1)], ".password-");
        assert_eq!(visible.len(), 1);
        assert!(password.is_none());
    }

    #[test]
    fn test_paginate() {
        let files: Vec<File> = (1..=5).map(|i| file(&i.to_string(), i)).collect();

        assert_eq!(paginate(files.clone(), 0, 0).unwrap().len(), 5);
        assert_eq!(names(&paginate(files.clone(), 2, 2).unwrap()), vec!["3", "4"]);
        assert_eq!(names(&paginate(files.clone(), 3, 2).unwrap()), vec!["5"]);
        assert!(paginate(files.clone(), 9, 2).unwrap().is_empty());
        assert!(matches!(
            paginate(files, 0, 10),
            Err(DriveError::InvalidRequest(_))
        ));
    }
}
