//! Shell metrics and timing constants.

use leptos::logging;
use platform_host::{load_pref_with, PrefsStore, SHELL_CONFIG_PREFS_KEY};
use serde::{Deserialize, Serialize};

use crate::placement::GridMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Every tunable metric used by the interaction engine.
///
/// Partial overrides are accepted: missing fields keep their defaults.
pub struct ShellConfig {
    /// Inset between the desktop edge and the first icon cell.
    pub desktop_padding: i32,
    pub icon_width: i32,
    /// Visual icon height (glyph plus label).
    pub icon_visual_height: i32,
    pub icon_margin: i32,
    /// Pointer travel (Euclidean, px) that turns a pending icon drag into an active one.
    pub drag_threshold_px: i32,
    /// Distance from the top/left/right viewport edge that arms a window snap.
    pub snap_zone_px: i32,
    /// Viewports narrower than this never snap.
    pub snap_disable_width: i32,
    /// Viewports narrower than this open every window forced-maximized.
    pub forced_maximize_width: i32,
    pub taskbar_height: i32,
    pub long_press_ms: u64,
    pub double_click_ms: u64,
    /// Stored icon layouts are discarded when the desktop width changed by more than this.
    pub layout_invalidate_tolerance_px: i32,
    /// Horizontal part of a released window that must stay on-screen.
    pub min_visible_sliver_px: i32,
    pub title_bar_height: i32,
    pub cascade_step_px: i32,
    pub cascade_slots: usize,
    /// Ring bound of the free-cell spiral search.
    pub max_search_radius: i32,
    /// Below this width the desktop lays icons out in a single column.
    pub narrow_breakpoint: i32,
    pub min_window_width: i32,
    pub min_window_height: i32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            desktop_padding: 10,
            icon_width: 72,
            icon_visual_height: 102,
            icon_margin: 10,
            drag_threshold_px: 5,
            snap_zone_px: 30,
            snap_disable_width: 768,
            forced_maximize_width: 480,
            taskbar_height: 44,
            long_press_ms: 700,
            double_click_ms: 300,
            layout_invalidate_tolerance_px: 50,
            min_visible_sliver_px: 80,
            title_bar_height: 34,
            cascade_step_px: 25,
            cascade_slots: 10,
            max_search_radius: 24,
            narrow_breakpoint: 360,
            min_window_width: 150,
            min_window_height: 100,
        }
    }
}

impl ShellConfig {
    /// Grid geometry derived from the icon metrics.
    pub fn grid(&self) -> GridMetrics {
        GridMetrics {
            cell_width: self.icon_width + self.icon_margin,
            cell_height: self.icon_visual_height + self.icon_margin,
            padding: self.desktop_padding,
        }
    }
}

/// Loads shell overrides from the prefs store, falling back to defaults.
pub async fn load_shell_config(prefs: &dyn PrefsStore) -> ShellConfig {
    match load_pref_with::<_, ShellConfig>(prefs, SHELL_CONFIG_PREFS_KEY).await {
        Ok(Some(config)) => config,
        Ok(None) => ShellConfig::default(),
        Err(err) => {
            logging::warn!("shell config load failed, using defaults: {err}");
            ShellConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryPrefsStore;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn grid_cells_include_icon_margin() {
        let grid = ShellConfig::default().grid();
        assert_eq!((grid.cell_width, grid.cell_height, grid.padding), (82, 112, 10));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let prefs = MemoryPrefsStore::default();
        block_on(prefs.save_pref(SHELL_CONFIG_PREFS_KEY, r#"{"snap_zone_px": 12}"#))
            .expect("save");

        let config = block_on(load_shell_config(&prefs));
        assert_eq!(config.snap_zone_px, 12);
        assert_eq!(config.taskbar_height, 44);
    }

    #[test]
    fn undecodable_override_falls_back_to_defaults() {
        let prefs = MemoryPrefsStore::default();
        block_on(prefs.save_pref(SHELL_CONFIG_PREFS_KEY, "[1, 2")).expect("save");
        assert_eq!(block_on(load_shell_config(&prefs)), ShellConfig::default());
    }
}
