//! Desktop state model: windows, desktop icons, viewport, and pointer input.

use desktop_app_contract::{ApplicationId, WindowDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ShellConfig;

/// Schema version of the persisted icon layout.
pub const ICON_LAYOUT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    /// Returns `true` when `point` lies inside the rectangle (right/bottom edges excluded).
    pub fn contains(self, point: PointerPosition) -> bool {
        point.x >= self.x
            && point.x < self.x + self.w
            && point.y >= self.y
            && point.y < self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub auto_focus_content: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            minimizable: true,
            maximizable: true,
            auto_focus_content: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Window lifecycle phase.
pub enum WindowPhase {
    /// Allocated, app instance not yet attached.
    Opening,
    Normal,
    Minimized,
    Maximized,
    /// Close hook in flight; the window is still present.
    Closing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub app_id: ApplicationId,
    pub title: String,
    pub glyph: String,
    pub rect: WindowRect,
    /// Geometry to return to after maximize or edge snap.
    pub restore_rect: Option<WindowRect>,
    pub z_index: u32,
    pub is_focused: bool,
    pub minimized: bool,
    pub maximized: bool,
    /// Opened on a narrow viewport; never resizable or restorable.
    pub forced_maximized: bool,
    /// Docked to the left or right half of the work area.
    pub snapped: bool,
    pub modal: bool,
    pub flags: WindowFlags,
    pub phase: WindowPhase,
    /// Inner element to refocus after restore.
    pub last_focus_target: Option<String>,
    pub launch_params: Value,
}

impl WindowRecord {
    /// Recomputes [`WindowRecord::phase`] from the visibility flags. `Opening` and `Closing` are
    /// left alone.
    pub fn sync_phase(&mut self) {
        if matches!(self.phase, WindowPhase::Opening | WindowPhase::Closing) {
            return;
        }
        self.phase = self.settled_phase();
    }

    /// Phase implied by the visibility flags alone.
    pub fn settled_phase(&self) -> WindowPhase {
        if self.minimized {
            WindowPhase::Minimized
        } else if self.maximized {
            WindowPhase::Maximized
        } else {
            WindowPhase::Normal
        }
    }

    pub fn is_closing(&self) -> bool {
        self.phase == WindowPhase::Closing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Parameters for allocating a new window.
pub struct OpenWindowRequest {
    pub app_id: ApplicationId,
    pub title: String,
    pub glyph: String,
    pub size: WindowDefaults,
    pub modal: bool,
    pub flags: WindowFlags,
    pub launch_params: Value,
}

impl OpenWindowRequest {
    pub fn new(app_id: ApplicationId, title: impl Into<String>) -> Self {
        Self {
            app_id,
            title: title.into(),
            glyph: String::new(),
            size: WindowDefaults::default(),
            modal: false,
            flags: WindowFlags::default(),
            launch_params: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl Viewport {
    /// Viewport minus the taskbar strip.
    pub fn work_area(self, taskbar_height: i32) -> WindowRect {
        WindowRect {
            x: 0,
            y: 0,
            w: self.width,
            h: (self.height - taskbar_height).max(0),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IconPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconKind {
    App,
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One rendered desktop icon.
pub struct DesktopIcon {
    pub id: String,
    pub kind: IconKind,
    pub label: String,
    pub glyph: String,
    pub position: IconPosition,
    /// VFS path for file and folder icons.
    pub backing_path: Option<String>,
    /// Launch target for app icons.
    pub app_id: Option<ApplicationId>,
}

impl DesktopIcon {
    pub fn is_vfs_backed(&self) -> bool {
        self.backing_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopState {
    pub next_window_id: u64,
    pub windows: Vec<WindowRecord>,
    pub icons: Vec<DesktopIcon>,
    pub active_icon: Option<String>,
    pub viewport: Viewport,
    pub config: ShellConfig,
}

impl Default for DesktopState {
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}

impl DesktopState {
    pub fn with_config(config: ShellConfig) -> Self {
        Self {
            next_window_id: 1,
            windows: Vec::new(),
            icons: Vec::new(),
            active_icon: None,
            viewport: Viewport::default(),
            config,
        }
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn icon(&self, icon_id: &str) -> Option<&DesktopIcon> {
        self.icons.iter().find(|icon| icon.id == icon_id)
    }

    /// Work area (viewport minus taskbar) for the current configuration.
    pub fn work_area(&self) -> WindowRect {
        self.viewport.work_area(self.config.taskbar_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Normalized pointer event delivered by the host.
pub struct PointerInput {
    pub pointer_id: i32,
    pub position: PointerPosition,
    pub kind: PointerKind,
    /// Primary (left) button, or any contact for touch.
    pub primary: bool,
    /// Host event timestamp in milliseconds.
    pub time_ms: u64,
}

impl PointerInput {
    /// Primary-button mouse/pen input.
    pub fn mouse(pointer_id: i32, x: i32, y: i32, time_ms: u64) -> Self {
        Self {
            pointer_id,
            position: PointerPosition { x, y },
            kind: PointerKind::Mouse,
            primary: true,
            time_ms,
        }
    }

    pub fn touch(pointer_id: i32, x: i32, y: i32, time_ms: u64) -> Self {
        Self {
            pointer_id,
            position: PointerPosition { x, y },
            kind: PointerKind::Touch,
            primary: true,
            time_ms,
        }
    }

    /// Whether this input may start a drag (primary button or any touch contact).
    pub fn can_drag(&self) -> bool {
        self.primary || self.kind == PointerKind::Touch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    /// Parses a handle label (`n`, `se`, ...).
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "n" => Self::North,
            "s" => Self::South,
            "e" => Self::East,
            "w" => Self::West,
            "ne" => Self::NorthEast,
            "nw" => Self::NorthWest,
            "se" => Self::SouthEast,
            "sw" => Self::SouthWest,
            _ => return None,
        })
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }

    pub const fn includes_north(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    pub const fn includes_south(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }

    pub const fn includes_east(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    pub const fn includes_west(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Docking layout previewed while a window is dragged into a snap zone.
pub enum SnapTarget {
    Top,
    Left,
    Right,
}
