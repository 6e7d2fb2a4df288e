//! Virtual-path helpers shared by the VFS service and desktop views.
//!
//! Paths are rooted at `/`. Folder paths always end in `/` (the root is `/` itself) and file paths
//! never do, so the trailing slash alone distinguishes the two kinds of key in the store.

/// Root directory path.
pub const ROOT_PATH: &str = "/";

/// Name and parent components of a virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// Final path segment (`/` for the root).
    pub name: String,
    /// Canonical parent folder path, or `None` for the root.
    pub parent_path: Option<String>,
}

/// Splits a path into its final segment and canonical parent folder.
///
/// One trailing slash is ignored, so `/a/b/` and `/a/b` both yield `{ name: "b", parent: "/a/" }`.
/// Children of the root report `/` as their parent.
pub fn parse_path(path: &str) -> PathInfo {
    if path == ROOT_PATH {
        return PathInfo {
            name: ROOT_PATH.to_string(),
            parent_path: None,
        };
    }

    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => {
            let parent = &trimmed[..idx];
            PathInfo {
                name: trimmed[idx + 1..].to_string(),
                parent_path: Some(if parent.is_empty() {
                    ROOT_PATH.to_string()
                } else {
                    format!("{parent}/")
                }),
            }
        }
        None => PathInfo {
            name: trimmed.to_string(),
            parent_path: Some(ROOT_PATH.to_string()),
        },
    }
}

/// Ensures a directory path ends with `/`. Empty input is returned unchanged.
pub fn normalize_dir(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Returns the canonical storage key for a file or folder path.
pub fn canonical_path(path: &str, is_folder: bool) -> String {
    if is_folder {
        normalize_dir(path)
    } else if path != ROOT_PATH {
        path.strip_suffix('/').unwrap_or(path).to_string()
    } else {
        path.to_string()
    }
}

/// Returns the alternate-kind key for `path` (`/a` for `/a/` and vice versa).
///
/// Used to detect a file and a folder competing for the same display name.
pub fn sibling_kind_path(path: &str) -> Option<String> {
    if path == ROOT_PATH {
        return None;
    }
    Some(match path.strip_suffix('/') {
        Some(file_form) => file_form.to_string(),
        None => format!("{path}/"),
    })
}

/// Joins a child name onto a directory path.
pub fn join_child(dir: &str, name: &str, is_folder: bool) -> String {
    canonical_path(&format!("{}{name}", normalize_dir(dir)), is_folder)
}

/// Returns `true` when `path` lies strictly beneath the folder `dir`.
pub fn is_within(path: &str, dir: &str) -> bool {
    let dir = normalize_dir(dir);
    path.len() > dir.len() && path.starts_with(&dir)
}

/// Replaces the `old_prefix` folder prefix of `path` with `new_prefix`.
///
/// Returns `None` when `path` is neither `old_prefix` nor beneath it.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let relative = path.strip_prefix(old_prefix)?;
    Some(format!("{new_prefix}{relative}"))
}

/// Normalizes a user-typed virtual path.
///
/// This helper trims whitespace, converts backslashes to `/`, resolves `.`/`..`, ensures a
/// leading slash, and returns `/` for empty or fully-collapsed paths. The result carries no
/// trailing slash; callers apply [`normalize_dir`] once they know the target is a folder.
pub fn normalize_virtual_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return ROOT_PATH.to_string();
    }

    let mut out = String::new();
    for segment in trimmed.replace('\\', "/").split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            if let Some(idx) = out.rfind('/') {
                out.truncate(idx);
            }
            continue;
        }
        out.push('/');
        out.push_str(segment);
    }

    if out.is_empty() {
        ROOT_PATH.to_string()
    } else {
        out
    }
}
