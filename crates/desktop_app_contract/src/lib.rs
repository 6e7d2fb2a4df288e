//! Shared contract types between the desktop window registry and managed apps.
//!
//! Apps are launched through the [`Launchable`] trait and return an [`AppInstance`] that lives as
//! long as its window. Instances reach the rest of the desktop only through [`AppServices`]: the
//! shared virtual filesystem, host dialogs, and an [`AppCommand`] channel back to the runtime.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{any::Any, rc::Rc};

use futures::future::LocalBoxFuture;
use platform_host::{DialogService, VfsChange, VfsService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stable identifier for a runtime-managed window.
pub type WindowRuntimeId = u64;

/// Stable identifier for an app package/module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` conforms to the `segment.segment...` policy.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected namespaced dotted segments"
            ))
        }
    }

    /// Builds the `user.<slug>` id for a dynamically registered app from a free-form name.
    pub fn for_user_app(name: &str) -> Result<Self, String> {
        let mut slug = String::new();
        for ch in name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        let slug = if slug.starts_with(|ch: char| ch.is_ascii_lowercase()) {
            slug.to_string()
        } else {
            format!("app-{slug}")
        };
        Self::new(format!("user.{slug}"))
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for compile-time/runtime trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns `true` for dynamically registered (`user.*`) apps.
    pub fn is_user_app(&self) -> bool {
        self.0.starts_with("user.")
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 120 {
        return false;
    }

    let mut count = 0usize;
    for part in raw.split('.') {
        count += 1;
        if part.is_empty() || part.len() > 48 {
            return false;
        }
        let bytes = part.as_bytes();
        if !bytes[0].is_ascii_lowercase() {
            return false;
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return false;
        }
        if part.ends_with('-') {
            return false;
        }
    }

    count >= 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Lifecycle events delivered by the window registry.
pub enum AppLifecycleEvent {
    /// Instance has been attached to its window.
    Mounted,
    /// Window became focused.
    Focused,
    /// Window lost focus.
    Blurred,
    /// Window was minimized.
    Minimized,
    /// Window was restored from minimized/maximized state.
    Restored,
    /// Window close sequence started.
    Closing,
    /// Window close sequence completed.
    Closed,
}

impl AppLifecycleEvent {
    /// Returns a stable string token for debugging hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Mounted => "mounted",
            Self::Focused => "focused",
            Self::Blurred => "blurred",
            Self::Minimized => "minimized",
            Self::Restored => "restored",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Commands emitted by app services to the desktop runtime.
pub enum AppCommand {
    /// Request a title update for the current window.
    SetWindowTitle {
        /// New title text.
        title: String,
    },
    /// Open another app (for example notepad for a `.txt` file).
    OpenApp {
        /// Target app id.
        app_id: ApplicationId,
        /// Launch params for the new window.
        params: Value,
    },
    /// Ask the runtime to close the current window (still subject to the close hook).
    CloseWindow,
    /// Emit a host notification.
    Notify {
        /// Notification title.
        title: String,
        /// Notification body.
        body: String,
    },
}

/// Runtime-side receiver for [`AppCommand`]s tagged with the sending window.
pub type AppCommandSender = Rc<dyn Fn(WindowRuntimeId, AppCommand)>;

#[derive(Clone)]
/// Injected app services bundle, one per window.
pub struct AppServices {
    /// Shared virtual filesystem.
    pub vfs: VfsService,
    /// Host confirm/prompt dialogs.
    pub dialogs: Rc<dyn DialogService>,
    window_id: WindowRuntimeId,
    sender: AppCommandSender,
}

impl AppServices {
    /// Creates a service bundle bound to `window_id`.
    pub fn new(
        window_id: WindowRuntimeId,
        vfs: VfsService,
        dialogs: Rc<dyn DialogService>,
        sender: AppCommandSender,
    ) -> Self {
        Self {
            vfs,
            dialogs,
            window_id,
            sender,
        }
    }

    /// Window these services are bound to.
    pub fn window_id(&self) -> WindowRuntimeId {
        self.window_id
    }

    /// Low-level transport send.
    pub fn send(&self, command: AppCommand) {
        (self.sender)(self.window_id, command);
    }

    /// Requests a window title update.
    pub fn set_title(&self, title: impl Into<String>) {
        self.send(AppCommand::SetWindowTitle {
            title: title.into(),
        });
    }

    /// Requests a host notification.
    pub fn notify(&self, title: impl Into<String>, body: impl Into<String>) {
        self.send(AppCommand::Notify {
            title: title.into(),
            body: body.into(),
        });
    }

    /// Requests opening another app.
    pub fn open_app(&self, app_id: ApplicationId, params: Value) {
        self.send(AppCommand::OpenApp { app_id, params });
    }
}

#[derive(Clone)]
/// Launch context injected by the runtime per window instance.
pub struct AppLaunchContext {
    /// Stable app id from the runtime catalog.
    pub app_id: ApplicationId,
    /// Stable runtime window id.
    pub window_id: WindowRuntimeId,
    /// Launch params supplied at window-open time.
    pub launch_params: Value,
    /// Runtime service bundle.
    pub services: AppServices,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Reasons a launch can fail.
pub enum LaunchError {
    /// No launchable is registered for the id.
    #[error("unknown application `{app_id}`")]
    UnknownApplication {
        /// Requested id.
        app_id: String,
    },
    /// The app needs the virtual filesystem and it is not ready.
    #[error("`{app_id}` requires the file system, which is not available")]
    FileSystemUnavailable {
        /// Requested id.
        app_id: String,
    },
    /// The app's own launch routine failed.
    #[error("`{app_id}` failed to launch: {reason}")]
    Failed {
        /// Requested id.
        app_id: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl LaunchError {
    /// Returns the id of the app that failed to launch.
    pub fn app_id(&self) -> &str {
        match self {
            Self::UnknownApplication { app_id }
            | Self::FileSystemUnavailable { app_id }
            | Self::Failed { app_id, .. } => app_id,
        }
    }
}

/// Live app instance owned by the window registry.
pub trait AppInstance {
    /// Receives lifecycle notifications for the owning window.
    fn on_lifecycle(&mut self, _event: AppLifecycleEvent) {}

    /// Async work to run once the window is attached (for example loading a file).
    fn on_mount(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        None
    }

    /// Called for every directory-change event published by the virtual filesystem.
    fn on_vfs_change(&mut self, _change: &VfsChange) -> Option<LocalBoxFuture<'static, ()>> {
        None
    }

    /// Close hook. A returned future resolving to `false` vetoes the close.
    fn on_close(&mut self) -> Option<LocalBoxFuture<'static, bool>> {
        None
    }

    /// Returns a JSON snapshot of user-visible state for diagnostics.
    fn snapshot(&self) -> Value {
        Value::Null
    }

    /// Upcast for concrete-type access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for concrete-type access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Something the registry can launch into a window.
pub trait Launchable {
    /// Creates an instance for the window described by `context`.
    fn launch(&self, context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError>;
}

/// Static launch function used by built-in app modules.
pub type AppLaunchFn = fn(AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError>;

#[derive(Debug, Clone, Copy)]
/// Built-in app module descriptor used by the runtime app registry.
pub struct AppModule {
    launch_fn: AppLaunchFn,
}

impl AppModule {
    /// Creates a module from a launch function.
    pub const fn new(launch_fn: AppLaunchFn) -> Self {
        Self { launch_fn }
    }
}

impl Launchable for AppModule {
    fn launch(&self, context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
        (self.launch_fn)(context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Default window size declared by an app.
pub struct WindowDefaults {
    /// Default width in px.
    pub width: i32,
    /// Default height in px.
    pub height: i32,
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Manifest-backed registration metadata for a runtime app entry.
pub struct AppRegistration {
    /// Canonical app id.
    pub app_id: ApplicationId,
    /// Human-readable display name.
    pub display_name: String,
    /// Glyph shown on icons, title bars, and taskbar buttons.
    pub glyph: String,
    /// Whether a second open focuses the existing window instead.
    #[serde(default)]
    pub single_instance: bool,
    /// Desktop icon visibility flag.
    #[serde(default)]
    pub show_on_desktop: bool,
    /// Launcher visibility flag.
    #[serde(default = "default_true")]
    pub show_in_launcher: bool,
    /// Modal windows block the rest of the desktop while open.
    #[serde(default)]
    pub modal: bool,
    /// Whether resize handles are offered.
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Whether maximize is offered.
    #[serde(default = "default_true")]
    pub maximizable: bool,
    /// Whether the content region receives focus on open/restore.
    #[serde(default = "default_true")]
    pub auto_focus_content: bool,
    /// Whether launch must wait for the virtual filesystem.
    #[serde(default)]
    pub requires_file_system: bool,
    /// Initial window size.
    #[serde(default)]
    pub window_defaults: WindowDefaults,
}

impl AppRegistration {
    /// Creates a registration with default flags.
    pub fn new(
        app_id: ApplicationId,
        display_name: impl Into<String>,
        glyph: impl Into<String>,
    ) -> Self {
        Self {
            app_id,
            display_name: display_name.into(),
            glyph: glyph.into(),
            single_instance: false,
            show_on_desktop: false,
            show_in_launcher: true,
            modal: false,
            resizable: true,
            maximizable: true,
            auto_focus_content: true,
            requires_file_system: false,
            window_defaults: WindowDefaults::default(),
        }
    }
}
