//! Pointer-session state machine shared by window drag, window resize, and icon drag.
//!
//! At most one session exists at a time. Transitions are driven from
//! [`crate::reducer::reduce_desktop`]; this module holds the session types and the pure helpers
//! the reducer uses to decide them.

use crate::model::{
    IconPosition, PointerKind, PointerPosition, ResizeEdge, SnapTarget, WindowId, WindowRect,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDragSession {
    pub icon_id: String,
    pub pointer_id: i32,
    pub pointer_kind: PointerKind,
    /// Icon position at pointer-down.
    pub origin: IconPosition,
    pub pointer_origin: PointerPosition,
}

impl IconDragSession {
    /// Icon position that keeps the grab point under `pointer`.
    pub fn follow(&self, pointer: PointerPosition) -> IconPosition {
        IconPosition {
            x: self.origin.x + (pointer.x - self.pointer_origin.x),
            y: self.origin.y + (pointer.y - self.pointer_origin.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDragSession {
    pub window_id: WindowId,
    pub pointer_id: i32,
    /// Window geometry at drag start.
    pub origin: WindowRect,
    pub pointer_origin: PointerPosition,
}

impl WindowDragSession {
    /// Window origin for the current pointer position (pointer minus grab offset).
    pub fn follow(&self, pointer: PointerPosition) -> WindowRect {
        self.origin.offset(
            pointer.x - self.pointer_origin.x,
            pointer.y - self.pointer_origin.y,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowResizeSession {
    pub window_id: WindowId,
    pub pointer_id: i32,
    pub edge: ResizeEdge,
    pub origin: WindowRect,
    pub pointer_origin: PointerPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// The one pointer-driven operation in progress, if any.
pub enum PointerSession {
    #[default]
    Idle,
    /// Pointer is down on an icon but has not travelled past the drag threshold.
    PendingIconDrag(IconDragSession),
    ActiveIconDrag(IconDragSession),
    ActiveWindowDrag(WindowDragSession),
    ActiveWindowResize(WindowResizeSession),
}

impl PointerSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Pointer that owns the session.
    pub fn pointer_id(&self) -> Option<i32> {
        match self {
            Self::Idle => None,
            Self::PendingIconDrag(session) | Self::ActiveIconDrag(session) => {
                Some(session.pointer_id)
            }
            Self::ActiveWindowDrag(session) => Some(session.pointer_id),
            Self::ActiveWindowResize(session) => Some(session.pointer_id),
        }
    }

    /// `true` when events from `pointer_id` drive this session.
    pub fn accepts(&self, pointer_id: i32) -> bool {
        self.pointer_id() == Some(pointer_id)
    }

    /// Icon currently lifted above the others.
    pub fn elevated_icon(&self) -> Option<&str> {
        match self {
            Self::ActiveIconDrag(session) => Some(&session.icon_id),
            _ => None,
        }
    }

    /// Window being dragged or resized.
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            Self::ActiveWindowDrag(session) => Some(session.window_id),
            Self::ActiveWindowResize(session) => Some(session.window_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Last pointer-down on an icon, for double-click detection.
pub struct IconTap {
    pub icon_id: String,
    pub time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub session: PointerSession,
    /// Snap layout armed by the current window drag.
    pub snap_target: Option<SnapTarget>,
    pub last_icon_tap: Option<IconTap>,
    /// Icon whose long-press timer is running.
    pub long_press_icon: Option<String>,
}

/// Euclidean travel strictly greater than `threshold`.
pub fn exceeds_threshold(from: PointerPosition, to: PointerPosition, threshold: i32) -> bool {
    let dx = i64::from(to.x - from.x);
    let dy = i64::from(to.y - from.y);
    let threshold = i64::from(threshold);
    dx * dx + dy * dy > threshold * threshold
}

/// Snap zone under `pointer`. The top edge wins over the sides.
pub fn snap_zone_for(
    pointer: PointerPosition,
    viewport_width: i32,
    zone: i32,
) -> Option<SnapTarget> {
    if pointer.y < zone {
        Some(SnapTarget::Top)
    } else if pointer.x < zone {
        Some(SnapTarget::Left)
    } else if pointer.x > viewport_width - zone {
        Some(SnapTarget::Right)
    } else {
        None
    }
}

/// Rectangle a window takes when snapped to `target` inside `work_area`.
pub fn snap_rect(target: SnapTarget, work_area: WindowRect) -> WindowRect {
    let half = work_area.w / 2;
    match target {
        SnapTarget::Top => work_area,
        SnapTarget::Left => WindowRect {
            w: half,
            ..work_area
        },
        SnapTarget::Right => WindowRect {
            x: work_area.x + work_area.w - half,
            w: half,
            ..work_area
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(x: i32, y: i32) -> PointerPosition {
        PointerPosition { x, y }
    }

    #[test]
    fn threshold_is_euclidean_and_strict() {
        assert!(!exceeds_threshold(at(0, 0), at(3, 4), 5));
        assert!(exceeds_threshold(at(0, 0), at(4, 4), 5));
        assert!(!exceeds_threshold(at(10, 10), at(12, 10), 5));
    }

    #[test]
    fn snap_zone_prefers_top_then_sides() {
        assert_eq!(snap_zone_for(at(5, 5), 1280, 30), Some(SnapTarget::Top));
        assert_eq!(snap_zone_for(at(5, 300), 1280, 30), Some(SnapTarget::Left));
        assert_eq!(snap_zone_for(at(1260, 300), 1280, 30), Some(SnapTarget::Right));
        assert_eq!(snap_zone_for(at(640, 300), 1280, 30), None);
    }

    #[test]
    fn snap_rects_split_the_work_area() {
        let work = WindowRect {
            x: 0,
            y: 0,
            w: 1280,
            h: 756,
        };
        assert_eq!(snap_rect(SnapTarget::Top, work), work);
        assert_eq!(
            snap_rect(SnapTarget::Right, work),
            WindowRect {
                x: 640,
                y: 0,
                w: 640,
                h: 756
            }
        );
    }

    #[test]
    fn foreign_pointers_are_not_accepted() {
        let session = PointerSession::ActiveWindowDrag(WindowDragSession {
            window_id: WindowId(1),
            pointer_id: 3,
            origin: WindowRect {
                x: 0,
                y: 0,
                w: 10,
                h: 10,
            },
            pointer_origin: at(0, 0),
        });
        assert!(session.accepts(3));
        assert!(!session.accepts(4));
        assert!(!PointerSession::Idle.accepts(3));
    }
}
