//! Window and icon interaction engine for the web desktop.
//!
//! The crate is headless: [`reduce_desktop`] is the pure state-transition function for windows,
//! icons and pointer sessions, and [`DesktopRuntime`] owns that state together with the app
//! registry and live app sessions, executing every [`RuntimeEffect`] against the injected
//! [`platform_host::HostServices`].

pub mod app_runtime;
pub mod apps;
pub mod config;
mod effect_executor;
pub mod icons;
pub mod interaction;
pub mod model;
pub mod persistence;
pub mod placement;
pub mod reducer;
pub mod runtime_context;
pub mod window_manager;

pub use app_runtime::{lifecycle_transitions, AppRuntimeState};
pub use apps::{AppEntry, AppRegistry, DynamicAppConfig};
pub use config::{load_shell_config, ShellConfig};
pub use icons::{IconNavKey, OpenTarget};
pub use interaction::{InteractionState, PointerSession};
pub use model::*;
pub use persistence::{load_icon_layout, persist_icon_layout, IconLayoutSnapshot};
pub use placement::{layout_pass, CellSearch, DesktopExtents, GridMetrics};
pub use reducer::{reduce_desktop, CursorStyle, DesktopAction, ReducerError, RuntimeEffect};
pub use runtime_context::{DesktopRuntime, RuntimeError};
