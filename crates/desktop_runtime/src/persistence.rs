//! Icon layout persistence through the host prefs store.

use std::collections::BTreeMap;

use leptos::logging;
use platform_host::{load_pref_with, save_pref_with, PrefsStore, ICON_LAYOUT_PREFS_KEY};
use serde::{Deserialize, Serialize};

use crate::model::{DesktopIcon, IconPosition, ICON_LAYOUT_SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Stored icon positions plus the desktop width they were laid out for.
pub struct IconLayoutSnapshot {
    pub schema_version: u32,
    pub desktop_width: i32,
    pub positions: BTreeMap<String, IconPosition>,
}

impl IconLayoutSnapshot {
    /// Captures the current icon positions.
    pub fn capture(icons: &[DesktopIcon], desktop_width: i32) -> Self {
        Self {
            schema_version: ICON_LAYOUT_SCHEMA_VERSION,
            desktop_width,
            positions: icons
                .iter()
                .map(|icon| (icon.id.clone(), icon.position))
                .collect(),
        }
    }
}

/// Loads persisted icon positions valid for `desktop_width`.
///
/// Returns an empty map when nothing is stored, the schema differs, the payload does not decode,
/// or the width changed by more than `tolerance_px`.
pub async fn load_icon_layout(
    prefs: &dyn PrefsStore,
    desktop_width: i32,
    tolerance_px: i32,
) -> BTreeMap<String, IconPosition> {
    let snapshot = match load_pref_with::<_, IconLayoutSnapshot>(prefs, ICON_LAYOUT_PREFS_KEY).await
    {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return BTreeMap::new(),
        Err(err) => {
            logging::warn!("icon layout load failed: {err}");
            return BTreeMap::new();
        }
    };

    if snapshot.schema_version != ICON_LAYOUT_SCHEMA_VERSION {
        logging::warn!(
            "discarding icon layout with schema {} (expected {})",
            snapshot.schema_version,
            ICON_LAYOUT_SCHEMA_VERSION
        );
        return BTreeMap::new();
    }
    if (snapshot.desktop_width - desktop_width).abs() > tolerance_px {
        logging::log!(
            "icon layout saved at width {} is stale for width {desktop_width}; re-laying out",
            snapshot.desktop_width
        );
        return BTreeMap::new();
    }
    snapshot.positions
}

/// Persists the current icon positions.
///
/// # Errors
///
/// Returns the prefs store error message when the write fails.
pub async fn persist_icon_layout(
    prefs: &dyn PrefsStore,
    icons: &[DesktopIcon],
    desktop_width: i32,
) -> Result<(), String> {
    let snapshot = IconLayoutSnapshot::capture(icons, desktop_width);
    save_pref_with(prefs, ICON_LAYOUT_PREFS_KEY, &snapshot).await
}
