//! Shared window-manager transition helpers used by the desktop reducer.

use desktop_app_contract::WindowDefaults;

use crate::{
    config::ShellConfig,
    model::{DesktopState, ResizeEdge, Viewport, WindowId, WindowRecord, WindowRect},
    reducer::ReducerError,
};

/// Allocates the next window id.
pub fn next_window_id(state: &mut DesktopState) -> WindowId {
    let id = WindowId(state.next_window_id);
    state.next_window_id = state.next_window_id.saturating_add(1);
    id
}

pub fn find_window_mut(
    state: &mut DesktopState,
    window_id: WindowId,
) -> Result<&mut WindowRecord, ReducerError> {
    state
        .windows
        .iter_mut()
        .find(|w| w.id == window_id)
        .ok_or(ReducerError::WindowNotFound)
}

/// Focuses and raises `window_id`, un-hiding it when minimized.
pub fn focus_window_internal(
    state: &mut DesktopState,
    window_id: WindowId,
) -> Result<(), ReducerError> {
    let index = state
        .windows
        .iter()
        .position(|w| w.id == window_id)
        .ok_or(ReducerError::WindowNotFound)?;
    let already_focused_top = index + 1 == state.windows.len()
        && state
            .windows
            .get(index)
            .map(|w| w.is_focused && !w.minimized)
            .unwrap_or(false);
    if already_focused_top {
        return Ok(());
    }
    for window in &mut state.windows {
        window.is_focused = false;
    }
    let mut window = state.windows.remove(index);
    window.is_focused = true;
    window.minimized = false;
    state.windows.push(window);
    normalize_window_stack(state);
    Ok(())
}

/// Normalizes z-index ordering, focus, and phase invariants for all managed windows.
///
/// Stacking order is vector order. When nothing is focused, the top-most non-minimized window
/// takes focus.
pub fn normalize_window_stack(state: &mut DesktopState) {
    let mut has_focused = false;
    for (idx, window) in state.windows.iter_mut().enumerate() {
        window.z_index = (idx + 1) as u32;
        if window.minimized {
            window.is_focused = false;
        }
        if window.is_focused {
            if has_focused {
                window.is_focused = false;
            } else {
                has_focused = true;
            }
        }
        window.sync_phase();
    }

    if !has_focused {
        if let Some(last_non_minimized) = state.windows.iter_mut().rev().find(|w| !w.minimized) {
            last_non_minimized.is_focused = true;
        }
    }
}

/// Applies resize deltas for a given edge/corner drag.
///
/// Width and height never drop below the floors. Shrinking from the west or north edge past the
/// floor pins the opposite edge where the floor puts it.
pub fn resize_rect(
    start: WindowRect,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    min_w: i32,
    min_h: i32,
) -> WindowRect {
    let mut rect = start;
    if edge.includes_east() {
        rect.w = (start.w + dx).max(min_w);
    }
    if edge.includes_south() {
        rect.h = (start.h + dy).max(min_h);
    }
    if edge.includes_west() {
        let proposed = start.w - dx;
        if proposed >= min_w {
            rect.w = proposed;
            rect.x = start.x + dx;
        } else {
            rect.w = min_w;
            rect.x = start.x + (start.w - min_w);
        }
    }
    if edge.includes_north() {
        let proposed = start.h - dy;
        if proposed >= min_h {
            rect.h = proposed;
            rect.y = start.y + dy;
        } else {
            rect.h = min_h;
            rect.y = start.y + (start.h - min_h);
        }
    }
    rect
}

/// Keeps a released window reachable: a sliver stays on-screen horizontally and the title bar
/// stays above the taskbar.
pub fn clamp_to_visible(rect: WindowRect, viewport: Viewport, config: &ShellConfig) -> WindowRect {
    let sliver = config.min_visible_sliver_px;
    let max_y = viewport.height - config.taskbar_height - config.title_bar_height;
    WindowRect {
        x: rect.x.min(viewport.width - sliver).max(-rect.w + sliver),
        y: rect.y.min(max_y).max(0),
        ..rect
    }
}

/// Initial geometry for a new window and whether it is forced-maximized.
///
/// Narrow viewports get the whole work area. Otherwise windows are centred and cascaded by
/// `(open_count % slots) * step`, clamped to stay on-screen.
pub fn initial_window_rect(
    size: WindowDefaults,
    open_count: usize,
    viewport: Viewport,
    config: &ShellConfig,
) -> (WindowRect, bool) {
    let work_area = viewport.work_area(config.taskbar_height);
    if viewport.width < config.forced_maximize_width {
        return (work_area, true);
    }

    let slots = config.cascade_slots.max(1);
    let offset = (open_count % slots) as i32 * config.cascade_step_px;
    let w = size.width.max(config.min_window_width);
    let h = size.height.max(config.min_window_height);
    let x = ((work_area.w - w) / 2 + offset).min(work_area.w - w - 20).max(0);
    let y = ((work_area.h - h) / 2 + offset).min(work_area.h - h - 20).max(0);
    (WindowRect { x, y, w, h }, false)
}

/// Fallback geometry when a maximized window has no remembered rectangle.
pub fn fallback_restore_rect(work_area: WindowRect) -> WindowRect {
    WindowRect {
        x: work_area.w / 10,
        y: work_area.h / 10,
        w: work_area.w * 8 / 10,
        h: work_area.h * 8 / 10,
    }
}
