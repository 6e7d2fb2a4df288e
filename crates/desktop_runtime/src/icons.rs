//! Desktop icon registry: icon identity, glyphs, open targets, and keyboard navigation.
//!
//! Icons come from two sources: registered apps flagged `show_on_desktop`, and the direct children
//! of `/Desktop/` in the virtual filesystem. Positions are assigned later by
//! [`crate::placement::layout_pass`].

use desktop_app_contract::{AppRegistration, ApplicationId};
use platform_host::{file_extension, VfsItem};
use serde_json::{json, Value};

use crate::{
    apps,
    model::{DesktopIcon, IconKind, IconPosition},
    placement::sort_icons,
};

const FILE_ICON_PREFIX: &str = "desktop-file-";
const APP_ICON_PREFIX: &str = "desktop-app-";

pub const FOLDER_GLYPH: &str = "📁";
pub const TEXT_GLYPH: &str = "📝";
pub const IMAGE_GLYPH: &str = "🖼️";
pub const GENERIC_FILE_GLYPH: &str = "📄";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Stable icon id for a VFS-backed icon.
///
/// `/` becomes `_`; letters, digits, `-` and `.` are kept; every other character is written as
/// `~` followed by the hex of its UTF-8 bytes. Distinct paths always get distinct ids.
pub fn desktop_icon_id_for_path(path: &str) -> String {
    let mut id = String::with_capacity(FILE_ICON_PREFIX.len() + path.len());
    id.push_str(FILE_ICON_PREFIX);
    for c in path.chars() {
        match c {
            '/' => id.push('_'),
            c if c.is_alphanumeric() || c == '-' || c == '.' => id.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    id.push_str(&format!("~{byte:02x}"));
                }
            }
        }
    }
    id
}

pub fn app_icon_id(app_id: &ApplicationId) -> String {
    format!("{APP_ICON_PREFIX}{}", app_id.as_str().replace('.', "-"))
}

/// What a file name looks like to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFlavor {
    Text,
    Image,
    Other,
}

pub fn file_flavor(name: &str) -> FileFlavor {
    match file_extension(name).as_deref() {
        Some("txt") => FileFlavor::Text,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => FileFlavor::Image,
        _ => FileFlavor::Other,
    }
}

pub fn glyph_for_item(item: &VfsItem) -> &'static str {
    if item.is_folder() {
        return FOLDER_GLYPH;
    }
    match file_flavor(&item.name) {
        FileFlavor::Text => TEXT_GLYPH,
        FileFlavor::Image => IMAGE_GLYPH,
        FileFlavor::Other => GENERIC_FILE_GLYPH,
    }
}

fn app_icon(registration: &AppRegistration) -> DesktopIcon {
    DesktopIcon {
        id: app_icon_id(&registration.app_id),
        kind: IconKind::App,
        label: registration.display_name.clone(),
        glyph: registration.glyph.clone(),
        position: IconPosition::default(),
        backing_path: None,
        app_id: Some(registration.app_id.clone()),
    }
}

fn item_icon(item: &VfsItem) -> DesktopIcon {
    DesktopIcon {
        id: desktop_icon_id_for_path(&item.path),
        kind: if item.is_folder() {
            IconKind::Folder
        } else {
            IconKind::File
        },
        label: item.name.clone(),
        glyph: glyph_for_item(item).to_string(),
        position: IconPosition::default(),
        backing_path: Some(item.path.clone()),
        app_id: None,
    }
}

/// Builds the unplaced icon set in display order (apps first, then by label).
pub fn build_desktop_icons<'a>(
    apps: impl IntoIterator<Item = &'a AppRegistration>,
    desktop_items: &[VfsItem],
) -> Vec<DesktopIcon> {
    let mut icons: Vec<DesktopIcon> = apps
        .into_iter()
        .filter(|registration| registration.show_on_desktop)
        .map(app_icon)
        .chain(desktop_items.iter().map(item_icon))
        .collect();
    sort_icons(&mut icons);
    icons
}

#[derive(Debug, Clone, PartialEq)]
/// Result of activating an icon or an explorer entry.
pub enum OpenTarget {
    LaunchApp {
        app_id: ApplicationId,
        params: Value,
    },
    /// No handler for this file type; the user is told so.
    Unsupported { path: String },
}

/// Resolves how a VFS path is opened: folders in the explorer, text in the notepad, images in the
/// image viewer.
pub fn open_target_for_path(path: &str, is_folder: bool) -> OpenTarget {
    if is_folder {
        return OpenTarget::LaunchApp {
            app_id: apps::explorer_id(),
            params: json!({ "initialPath": path }),
        };
    }
    let name = path.rsplit('/').next().unwrap_or(path);
    match file_flavor(name) {
        FileFlavor::Text => OpenTarget::LaunchApp {
            app_id: apps::notepad_id(),
            params: json!({ "filePath": path }),
        },
        FileFlavor::Image => OpenTarget::LaunchApp {
            app_id: apps::image_viewer_id(),
            params: json!({ "filePath": path }),
        },
        FileFlavor::Other => OpenTarget::Unsupported {
            path: path.to_string(),
        },
    }
}

pub fn open_target_for_icon(icon: &DesktopIcon) -> Option<OpenTarget> {
    match (icon.kind, &icon.app_id, &icon.backing_path) {
        (IconKind::App, Some(app_id), _) => Some(OpenTarget::LaunchApp {
            app_id: app_id.clone(),
            params: Value::Null,
        }),
        (IconKind::Folder, _, Some(path)) => Some(open_target_for_path(path, true)),
        (IconKind::File, _, Some(path)) => Some(open_target_for_path(path, false)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Keys that move the icon selection.
pub enum IconNavKey {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Next selected index for keyboard navigation over `total` icons in display order.
///
/// Left/right wrap around; up/down move by a row and stop at the ends. With no selection, up
/// selects the last icon and everything else the first.
pub fn next_icon_index(
    current: Option<usize>,
    total: usize,
    per_row: usize,
    key: IconNavKey,
) -> Option<usize> {
    if total == 0 {
        return None;
    }
    let per_row = per_row.max(1);
    let last = total - 1;
    let Some(current) = current.filter(|index| *index < total) else {
        return Some(match key {
            IconNavKey::Up | IconNavKey::End => last,
            _ => 0,
        });
    };
    Some(match key {
        IconNavKey::Right => (current + 1) % total,
        IconNavKey::Left => (current + total - 1) % total,
        IconNavKey::Down => (current + per_row).min(last),
        IconNavKey::Up => current.saturating_sub(per_row),
        IconNavKey::Home => 0,
        IconNavKey::End => last,
    })
}
