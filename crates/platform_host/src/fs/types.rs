//! Virtual filesystem records and directory conventions.

use serde::{Deserialize, Serialize};

use super::path::{parse_path, ROOT_PATH};

/// Folder whose direct children back the desktop icon layer.
pub const DESKTOP_DIR: &str = "/Desktop/";
/// Default folder for user documents.
pub const DOCUMENTS_DIR: &str = "/Documents/";
/// Default folder for images.
pub const PICTURES_DIR: &str = "/Pictures/";
/// Default folder for downloads.
pub const DOWNLOADS_DIR: &str = "/Downloads/";
/// Folder holding soft-deleted items until restore or permanent delete.
pub const RECYCLE_BIN_DIR: &str = "/Recycle Bin/";
/// Folder holding dynamically registered applications.
pub const USER_APPS_DIR: &str = "/user_apps/";

/// Directories guaranteed to exist after [`crate::VfsService::init`], parent-first.
pub const BASE_DIRECTORIES: [&str; 7] = [
    ROOT_PATH,
    DESKTOP_DIR,
    DOCUMENTS_DIR,
    PICTURES_DIR,
    DOWNLOADS_DIR,
    RECYCLE_BIN_DIR,
    USER_APPS_DIR,
];

const TEXT_EXTENSIONS: [&str; 19] = [
    "js", "json", "css", "html", "md", "xml", "py", "java", "c", "cpp", "cs", "go", "php", "rb",
    "sh", "sql", "yaml", "yml", "ts",
];

/// Returns the lower-cased extension of a file name, if any.
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Derives the stored MIME type for a file name.
///
/// `txt` maps to `text/plain`, the known source/text extensions map to `text/<ext>`, and anything
/// else is `application/octet-stream`.
pub fn mime_type_for_name(name: &str) -> String {
    match file_extension(name) {
        Some(ext) if ext == "txt" => "text/plain".to_string(),
        Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => format!("text/{ext}"),
        _ => "application/octet-stream".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// Kind-specific payload of a [`VfsItem`].
pub enum VfsItemKind {
    /// Text file with its derived metadata.
    File {
        /// File body.
        content: String,
        /// MIME type derived from the file name.
        mime_type: String,
        /// UTF-8 byte length of `content`.
        size: u64,
    },
    /// Folder; its children are the items whose `parent_path` equals its path.
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Marker carried by the top-level item of a soft-deleted subtree.
pub struct RecycleTag {
    /// Path the item occupied before it was recycled.
    pub original_path: String,
    /// Unix timestamp (ms) used for the recycle-bin name suffix.
    pub recycled_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One stored file or folder record.
pub struct VfsItem {
    /// Canonical unique path (store key).
    pub path: String,
    /// Display name. Matches the last path segment except for recycled items, which keep the
    /// name they had before deletion.
    pub name: String,
    /// Canonical parent folder path, `None` only for the root.
    pub parent_path: Option<String>,
    /// Creation time (unix ms).
    pub created_at_unix_ms: u64,
    /// Last modification time (unix ms).
    pub modified_at_unix_ms: u64,
    /// File or folder payload.
    #[serde(flatten)]
    pub kind: VfsItemKind,
    /// Present only on the top-level item of a recycled subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycled: Option<RecycleTag>,
}

impl VfsItem {
    /// Builds a folder record for a canonical folder path.
    pub fn folder(path: &str, now_unix_ms: u64) -> Self {
        let info = parse_path(path);
        Self {
            path: path.to_string(),
            name: info.name,
            parent_path: info.parent_path,
            created_at_unix_ms: now_unix_ms,
            modified_at_unix_ms: now_unix_ms,
            kind: VfsItemKind::Folder,
            recycled: None,
        }
    }

    /// Builds a file record, deriving size and MIME type from the path and content.
    pub fn file(path: &str, content: String, created_unix_ms: u64, now_unix_ms: u64) -> Self {
        let info = parse_path(path);
        Self {
            path: path.to_string(),
            kind: VfsItemKind::File {
                mime_type: mime_type_for_name(&info.name),
                size: content.len() as u64,
                content,
            },
            name: info.name,
            parent_path: info.parent_path,
            created_at_unix_ms: created_unix_ms,
            modified_at_unix_ms: now_unix_ms,
            recycled: None,
        }
    }

    /// Returns `true` for folder records.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, VfsItemKind::Folder)
    }

    /// Returns `true` for file records.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, VfsItemKind::File { .. })
    }

    /// Returns `true` when this item is the top of a recycled subtree.
    pub fn is_recycled(&self) -> bool {
        self.recycled.is_some()
    }

    /// Returns the file body for file records.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            VfsItemKind::File { content, .. } => Some(content),
            VfsItemKind::Folder => None,
        }
    }

    /// Returns the stored byte size for file records.
    pub fn size(&self) -> Option<u64> {
        match &self.kind {
            VfsItemKind::File { size, .. } => Some(*size),
            VfsItemKind::Folder => None,
        }
    }

    /// Returns a copy relocated to `new_path` with parent and name re-derived.
    pub fn relocated(&self, new_path: &str) -> Self {
        let info = parse_path(new_path);
        Self {
            path: new_path.to_string(),
            name: info.name,
            parent_path: info.parent_path,
            ..self.clone()
        }
    }
}

/// Orders items for display: folders first, then case-insensitively by name.
pub fn sort_for_display(items: &mut [VfsItem]) {
    items.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.path.cmp(&b.path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension_table() {
        assert_eq!(mime_type_for_name("notes.txt"), "text/plain");
        assert_eq!(mime_type_for_name("README.MD"), "text/md");
        assert_eq!(mime_type_for_name("main.rs"), "application/octet-stream");
        assert_eq!(mime_type_for_name("Makefile"), "application/octet-stream");
        assert_eq!(mime_type_for_name(".yaml"), "application/octet-stream");
    }

    #[test]
    fn file_record_counts_utf8_bytes() {
        let item = VfsItem::file("/Documents/é.txt", "héllo".to_string(), 1, 2);
        assert_eq!(item.size(), Some(6));
        assert_eq!(item.name, "é.txt");
        assert_eq!(item.parent_path.as_deref(), Some("/Documents/"));
    }

    #[test]
    fn item_serializes_with_type_tag_and_omits_missing_recycle_tag() {
        let folder = VfsItem::folder("/Desktop/", 5);
        let json = serde_json::to_value(&folder).expect("serialize");
        assert_eq!(json["type"], "folder");
        assert!(json.get("recycled").is_none());

        let back: VfsItem = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, folder);
    }

    #[test]
    fn display_sort_puts_folders_first() {
        let mut items = vec![
            VfsItem::file("/b.txt", String::new(), 0, 0),
            VfsItem::folder("/Zed/", 0),
            VfsItem::file("/A.txt", String::new(), 0, 0),
            VfsItem::folder("/alpha/", 0),
        ];
        sort_for_display(&mut items);
        let names: Vec<_> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Zed", "A.txt", "b.txt"]);
    }
}
