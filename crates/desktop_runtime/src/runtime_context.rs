//! The desktop runtime context.
//!
//! [`DesktopRuntime`] owns the reducer state, the pointer interaction state, the app registry, the
//! live app sessions and the host service bundle. Every public operation funnels through the
//! reducer, then drains the resulting effect queue, the app command queue and the VFS change feed
//! until all three are empty. Presentation-only effects (cursor, pointer capture, focus moves,
//! context menus, timers, snap preview) are handed to the embedding shell through
//! [`DesktopRuntime::take_host_effects`].

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use desktop_app_contract::{
    AppCommand, AppInstance, AppLaunchContext, AppLifecycleEvent, AppServices, ApplicationId,
    LaunchError,
};
use futures::future::join_all;
use leptos::logging;
use platform_host::{join_child, HostServices, SubscriptionId, VfsChange, VfsError, DESKTOP_DIR};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    app_runtime::{lifecycle_transitions, AppCommandQueue, AppRuntimeState},
    apps::{self, sanitize_filename, AppEntry, AppRegistry, DynamicAppConfig},
    config::load_shell_config,
    icons::{build_desktop_icons, desktop_icon_id_for_path},
    interaction::InteractionState,
    model::{DesktopState, IconKind, Viewport, WindowId},
    persistence,
    placement::{layout_pass, DesktopExtents},
    reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect},
};

const DESKTOP_NOTICE_TITLE: &str = "Desktop";
const FILE_SYSTEM_NOTICE_TITLE: &str = "File System";
const FILE_SYSTEM_NOT_READY: &str = "File system is not yet ready. Please wait a moment and try again.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures surfaced by [`DesktopRuntime`] operations.
pub enum RuntimeError {
    #[error(transparent)]
    Reducer(#[from] ReducerError),
    #[error(transparent)]
    Vfs(#[from] VfsError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// The icon is an app shortcut, not a file or folder.
    #[error("icon `{icon_id}` is not backed by a file")]
    NotAFileIcon { icon_id: String },
}

/// Owns all desktop state and executes the side effects of every transition.
pub struct DesktopRuntime {
    pub(crate) host: HostServices,
    pub(crate) state: DesktopState,
    pub(crate) interaction: InteractionState,
    pub(crate) registry: AppRegistry,
    pub(crate) apps: AppRuntimeState,
    pub(crate) host_effects: Vec<RuntimeEffect>,
    effects: VecDeque<RuntimeEffect>,
    commands: AppCommandQueue,
    vfs_changes: Rc<RefCell<VecDeque<VfsChange>>>,
    vfs_subscription: SubscriptionId,
    /// Desktop width the current icon positions were laid out for.
    layout_width: Option<i32>,
}

impl Drop for DesktopRuntime {
    fn drop(&mut self) {
        self.host.vfs.unsubscribe(self.vfs_subscription);
    }
}

impl DesktopRuntime {
    /// Creates a runtime with the built-in apps registered. Call [`Self::boot`] before use.
    pub fn new(host: HostServices) -> Self {
        let vfs_changes: Rc<RefCell<VecDeque<VfsChange>>> = Rc::default();
        let feed = Rc::clone(&vfs_changes);
        let vfs_subscription = host
            .vfs
            .subscribe(move |change| feed.borrow_mut().push_back(change.clone()));
        Self {
            host,
            state: DesktopState::default(),
            interaction: InteractionState::default(),
            registry: AppRegistry::with_builtin_apps(),
            apps: AppRuntimeState::default(),
            host_effects: Vec::new(),
            effects: VecDeque::new(),
            commands: AppCommandQueue::default(),
            vfs_changes,
            vfs_subscription,
            layout_width: None,
        }
    }

    /// Loads shell config, initializes the file system, re-registers persisted dynamic apps and
    /// lays out the desktop icons.
    ///
    /// # Errors
    ///
    /// Returns the VFS initialization error. App icons are still laid out in that case and apps
    /// that do not need the file system remain launchable.
    pub async fn boot(&mut self, viewport: Viewport) -> Result<(), RuntimeError> {
        let config = load_shell_config(self.host.prefs.as_ref()).await;
        self.state = DesktopState::with_config(config);
        self.state.viewport = viewport;

        let init = self.host.vfs.init().await;
        match &init {
            Ok(()) => match apps::load_dynamic_apps(&self.host.vfs, &mut self.registry).await {
                Ok(0) => {}
                Ok(count) => logging::log!("restored {count} dynamic app(s)"),
                Err(err) => logging::warn!("dynamic apps could not be loaded: {err}"),
            },
            Err(err) => logging::error!("file system failed to initialize: {err}"),
        }
        // Seeding churn is covered by the refresh below.
        self.vfs_changes.borrow_mut().clear();

        self.refresh_desktop_icons().await;
        self.settle().await;
        init.map_err(RuntimeError::from)
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// Registry access for hosts that add their own apps.
    pub fn registry_mut(&mut self) -> &mut AppRegistry {
        &mut self.registry
    }

    pub fn host(&self) -> &HostServices {
        &self.host
    }

    /// Drains the presentation effects the shell has not consumed yet.
    pub fn take_host_effects(&mut self) -> Vec<RuntimeEffect> {
        std::mem::take(&mut self.host_effects)
    }

    /// Concrete app instance mounted in `window_id`.
    pub fn app<T: AppInstance + 'static>(&self, window_id: WindowId) -> Option<&T> {
        self.apps
            .instance(window_id)?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn app_mut<T: AppInstance + 'static>(&mut self, window_id: WindowId) -> Option<&mut T> {
        self.apps
            .instance_mut(window_id)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Last lifecycle event delivered to the app in `window_id`.
    pub fn lifecycle(&self, window_id: WindowId) -> Option<AppLifecycleEvent> {
        self.apps.lifecycle(window_id)
    }

    /// Runs one action through the reducer and executes everything it triggers.
    ///
    /// # Errors
    ///
    /// Returns the reducer error; state is left untouched in that case.
    pub async fn dispatch(&mut self, action: DesktopAction) -> Result<(), RuntimeError> {
        self.apply(action)?;
        self.settle().await;
        Ok(())
    }

    /// Opens `app_id` in a new window, or focuses its window when it is single-instance.
    ///
    /// Unknown ids and failed launches open the error window instead, whose id is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::FileSystemUnavailable`] when the app needs the file system before it
    /// is ready, and a [`LaunchError`] when the error window itself cannot be opened.
    pub async fn open_app(
        &mut self,
        app_id: ApplicationId,
        params: Value,
    ) -> Result<WindowId, RuntimeError> {
        let opened = self.launch_window(app_id, params).await;
        self.settle().await;
        opened
    }

    /// Closes a window unless its app vetoes. Returns whether the window was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::WindowNotFound`] for unknown windows.
    pub async fn close_window(&mut self, window_id: WindowId) -> Result<bool, RuntimeError> {
        let closed = self.close_window_inner(window_id).await;
        self.settle().await;
        closed
    }

    pub async fn focus(&mut self, window_id: WindowId) -> Result<(), RuntimeError> {
        self.dispatch(DesktopAction::FocusWindow { window_id }).await
    }

    pub async fn minimize(
        &mut self,
        window_id: WindowId,
        focus_target: Option<String>,
    ) -> Result<(), RuntimeError> {
        self.dispatch(DesktopAction::MinimizeWindow {
            window_id,
            focus_target,
        })
        .await
    }

    pub async fn restore(&mut self, window_id: WindowId) -> Result<(), RuntimeError> {
        self.dispatch(DesktopAction::RestoreWindow { window_id })
            .await
    }

    pub async fn toggle_maximize(&mut self, window_id: WindowId) -> Result<(), RuntimeError> {
        self.dispatch(DesktopAction::ToggleMaximize { window_id })
            .await
    }

    pub async fn toggle_taskbar_window(&mut self, window_id: WindowId) -> Result<(), RuntimeError> {
        self.dispatch(DesktopAction::ToggleTaskbarWindow { window_id })
            .await
    }

    /// Recycles the file or folder behind a desktop icon.
    ///
    /// Nothing happens unless `confirmed`; returns whether the item was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotAFileIcon`] for app shortcuts and the VFS error when the delete
    /// fails. Both are also reported as notifications.
    pub async fn delete_icon(&mut self, icon_id: &str, confirmed: bool) -> Result<bool, RuntimeError> {
        let icon = self
            .state
            .icon(icon_id)
            .cloned()
            .ok_or(ReducerError::IconNotFound)?;
        let Some(path) = icon.backing_path else {
            self.notify(
                DESKTOP_NOTICE_TITLE,
                &format!("App shortcut \"{}\" cannot be deleted.", icon.label),
            )
            .await;
            return Err(RuntimeError::NotAFileIcon { icon_id: icon.id });
        };
        if !confirmed {
            return Ok(false);
        }
        let deleted = self.host.vfs.delete_item(&path).await;
        if let Err(err) = &deleted {
            logging::warn!("deleting `{path}` failed: {err}");
            self.notify(DESKTOP_NOTICE_TITLE, "Failed to delete item.")
                .await;
        }
        self.settle().await;
        deleted.map(|_| true).map_err(RuntimeError::from)
    }

    /// Renames the item behind a desktop icon in place; the icon keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotAFileIcon`] for app shortcuts and the VFS error when the rename
    /// fails.
    pub async fn rename_icon(&mut self, icon_id: &str, new_name: &str) -> Result<String, RuntimeError> {
        let icon = self
            .state
            .icon(icon_id)
            .cloned()
            .ok_or(ReducerError::IconNotFound)?;
        let Some(old_path) = icon.backing_path else {
            return Err(RuntimeError::NotAFileIcon { icon_id: icon.id });
        };
        let new_path = join_child(
            DESKTOP_DIR,
            &sanitize_filename(new_name),
            icon.kind == IconKind::Folder,
        );
        if new_path == old_path {
            return Ok(new_path);
        }
        if let Err(err) = self.host.vfs.rename_item(&old_path, &new_path).await {
            logging::warn!("renaming `{old_path}` failed: {err}");
            self.notify(DESKTOP_NOTICE_TITLE, &format!("Failed to rename \"{}\".", icon.label))
                .await;
            return Err(err.into());
        }

        // Re-key the icon so the refresh keeps its cell.
        let new_id = desktop_icon_id_for_path(&new_path);
        let mut icons = self.state.icons.clone();
        if let Some(renamed) = icons.iter_mut().find(|candidate| candidate.id == icon.id) {
            renamed.id = new_id;
            renamed.backing_path = Some(new_path.clone());
        }
        if let Err(err) = self.apply(DesktopAction::SetDesktopIcons { icons }) {
            logging::warn!("re-keying icon for `{new_path}` failed: {err}");
        }
        self.settle().await;
        Ok(new_path)
    }

    /// Creates an empty text file on the desktop (`.txt` appended when missing).
    ///
    /// An existing file is only replaced when `overwrite_confirmed`.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::AlreadyExists`] for an unconfirmed overwrite, or the failing VFS error.
    pub async fn create_desktop_text_file(
        &mut self,
        name: &str,
        overwrite_confirmed: bool,
    ) -> Result<String, RuntimeError> {
        let mut name = sanitize_filename(name);
        if !name.to_lowercase().ends_with(".txt") {
            name.push_str(".txt");
        }
        let path = join_child(DESKTOP_DIR, &name, false);
        let exists = matches!(self.host.vfs.get_item(&path).await, Ok(Some(_)));
        if exists && !overwrite_confirmed {
            self.notify(
                DESKTOP_NOTICE_TITLE,
                &format!("File \"{name}\" already exists on the Desktop."),
            )
            .await;
            return Err(VfsError::AlreadyExists { path }.into());
        }
        let created = self.host.vfs.create_file(&path, "", true).await;
        if let Err(err) = &created {
            logging::warn!("creating `{path}` failed: {err}");
            self.notify(DESKTOP_NOTICE_TITLE, "Failed to create text file.")
                .await;
        }
        self.settle().await;
        created.map(|item| item.path).map_err(RuntimeError::from)
    }

    /// Creates a folder on the desktop.
    ///
    /// # Errors
    ///
    /// Returns the failing VFS error.
    pub async fn create_desktop_folder(&mut self, name: &str) -> Result<String, RuntimeError> {
        let path = join_child(DESKTOP_DIR, &sanitize_filename(name), true);
        let created = self.host.vfs.create_folder(&path).await;
        if let Err(err) = &created {
            logging::warn!("creating `{path}` failed: {err}");
            self.notify(DESKTOP_NOTICE_TITLE, "Failed to create folder.")
                .await;
        }
        self.settle().await;
        created.map(|item| item.path).map_err(RuntimeError::from)
    }

    /// Permanently removes everything in the recycle bin when `confirmed`. Returns the number of
    /// records removed.
    ///
    /// # Errors
    ///
    /// Returns the failing VFS error.
    pub async fn empty_recycle_bin(&mut self, confirmed: bool) -> Result<usize, RuntimeError> {
        if !confirmed {
            return Ok(0);
        }
        let removed = self.host.vfs.empty_recycle_bin().await;
        self.settle().await;
        Ok(removed?)
    }

    /// Registers a user HTML app, persists it when possible and refreshes the desktop.
    ///
    /// Returns whether the app was persisted.
    ///
    /// # Errors
    ///
    /// Returns the failing VFS write; the app stays launchable for this session.
    pub async fn register_dynamic_app(
        &mut self,
        config: &DynamicAppConfig,
        html: Option<&str>,
        icon_data_url: Option<&str>,
    ) -> Result<bool, RuntimeError> {
        let persisted = apps::register_dynamic_app(
            &self.host.vfs,
            &mut self.registry,
            config,
            html,
            icon_data_url,
        )
        .await;
        self.refresh_desktop_icons().await;
        self.settle().await;
        Ok(persisted?)
    }

    /// Records a pointer capture the host could not take. The session continues uncaptured.
    pub fn report_capture_failure(&self, pointer_id: i32, reason: &str) {
        logging::warn!("pointer capture for pointer {pointer_id} failed: {reason}");
    }

    /// Reducer step with commit-on-success, queueing its effects and delivering the lifecycle
    /// events the change implies.
    pub(crate) fn apply(&mut self, action: DesktopAction) -> Result<(), ReducerError> {
        let mut next_state = self.state.clone();
        let mut next_interaction = self.interaction.clone();
        match reduce_desktop(&mut next_state, &mut next_interaction, action) {
            Ok(effects) => {
                let transitions = lifecycle_transitions(&self.state.windows, &next_state.windows);
                self.state = next_state;
                self.interaction = next_interaction;
                self.effects.extend(effects);
                for (window_id, event) in transitions {
                    self.apps.set_lifecycle(window_id, event);
                }
                self.apps.sync_windows(&self.state.windows);
                Ok(())
            }
            Err(err) => {
                logging::warn!("desktop reducer error: {err}");
                Err(err)
            }
        }
    }

    /// Drains queued effects, app commands and VFS changes until none remain.
    ///
    /// Runtime operations settle on their own; call this after writing to the VFS directly.
    pub async fn settle(&mut self) {
        loop {
            if let Some(effect) = self.effects.pop_front() {
                self.run_effect(effect).await;
                continue;
            }
            if let Some((window_id, command)) = self.commands.pop() {
                self.run_command(window_id, command).await;
                continue;
            }
            let mut batch: Vec<VfsChange> = Vec::new();
            for change in self.vfs_changes.borrow_mut().drain(..) {
                if !batch.contains(&change) {
                    batch.push(change);
                }
            }
            if batch.is_empty() {
                break;
            }
            for change in batch {
                self.handle_vfs_change(change).await;
            }
        }
    }

    pub(crate) async fn launch_window(
        &mut self,
        app_id: ApplicationId,
        params: Value,
    ) -> Result<WindowId, RuntimeError> {
        let Some(entry) = self.registry.get(&app_id).cloned() else {
            logging::warn!("no app registered as `{app_id}`");
            return self.open_error_window(&app_id).await;
        };

        if entry.registration.single_instance {
            let existing = self
                .state
                .windows
                .iter()
                .find(|window| window.app_id == app_id && !window.is_closing())
                .map(|window| window.id);
            if let Some(window_id) = existing {
                self.apply(DesktopAction::FocusWindow { window_id })?;
                return Ok(window_id);
            }
        }

        if entry.registration.requires_file_system && !self.host.vfs.is_ready() {
            self.notify(FILE_SYSTEM_NOTICE_TITLE, FILE_SYSTEM_NOT_READY)
                .await;
            return Err(LaunchError::FileSystemUnavailable {
                app_id: app_id.to_string(),
            }
            .into());
        }

        match self.spawn_window(&entry, params).await {
            Ok(window_id) => Ok(window_id),
            Err(err) => {
                logging::error!("launching `{app_id}` failed: {err}");
                self.open_error_window(&app_id).await
            }
        }
    }

    /// Opens the error window for `errored`. Its own failure is returned, never retried.
    async fn open_error_window(&mut self, errored: &ApplicationId) -> Result<WindowId, RuntimeError> {
        let error_id = apps::error_id();
        if *errored == error_id {
            return Err(LaunchError::Failed {
                app_id: error_id.to_string(),
                reason: "the error window could not be opened".to_string(),
            }
            .into());
        }
        let entry = self
            .registry
            .get(&error_id)
            .cloned()
            .ok_or_else(|| LaunchError::UnknownApplication {
                app_id: error_id.to_string(),
            })?;
        let params = json!({ "erroredAppId": errored.as_str() });
        Ok(self.spawn_window(&entry, params).await?)
    }

    /// Allocates a window, launches the app into it and mounts the instance. The window is
    /// discarded when the launch fails.
    async fn spawn_window(&mut self, entry: &AppEntry, params: Value) -> Result<WindowId, LaunchError> {
        let app_id = entry.registration.app_id.clone();
        let window_id = WindowId(self.state.next_window_id);
        self.apply(DesktopAction::OpenWindow(apps::open_request_for(
            &entry.registration,
            params.clone(),
        )))
        .map_err(|err| LaunchError::Failed {
            app_id: app_id.to_string(),
            reason: err.to_string(),
        })?;

        let services = AppServices::new(
            window_id.0,
            self.host.vfs.clone(),
            Rc::clone(&self.host.dialogs),
            self.commands.sender(),
        );
        let context = AppLaunchContext {
            app_id: app_id.clone(),
            window_id: window_id.0,
            launch_params: params,
            services,
        };
        let instance = match entry.launcher.launch(context) {
            Ok(instance) => instance,
            Err(err) => {
                if let Err(discard) = self.apply(DesktopAction::DiscardWindow { window_id }) {
                    logging::warn!("discarding window {} failed: {discard}", window_id.0);
                }
                return Err(err);
            }
        };

        self.apps.mount(window_id, instance);
        if let Err(err) = self.apply(DesktopAction::WindowMounted { window_id }) {
            logging::error!("window {} vanished before `{app_id}` mounted: {err}", window_id.0);
            self.apps.close(window_id);
            return Err(LaunchError::Failed {
                app_id: app_id.to_string(),
                reason: err.to_string(),
            });
        }
        let mounted = self
            .apps
            .instance_mut(window_id)
            .and_then(|instance| instance.on_mount());
        if let Some(mounted) = mounted {
            mounted.await;
        }
        Ok(window_id)
    }

    async fn close_window_inner(&mut self, window_id: WindowId) -> Result<bool, RuntimeError> {
        let window = self
            .state
            .window(window_id)
            .ok_or(ReducerError::WindowNotFound)?;
        if window.is_closing() {
            return Ok(false);
        }
        self.apply(DesktopAction::BeginClose { window_id })?;

        let hook = self
            .apps
            .instance_mut(window_id)
            .and_then(|instance| instance.on_close());
        let allowed = match hook {
            Some(hook) => hook.await,
            None => true,
        };
        if !allowed {
            self.apply(DesktopAction::CancelClose { window_id })?;
            return Ok(false);
        }

        self.apps.close(window_id);
        self.apply(DesktopAction::FinishClose { window_id })?;
        Ok(true)
    }

    async fn run_command(&mut self, window_id: WindowId, command: AppCommand) {
        match command {
            AppCommand::SetWindowTitle { title } => {
                if let Err(err) = self.apply(DesktopAction::SetWindowTitle { window_id, title }) {
                    logging::log!("dropping title for window {}: {err}", window_id.0);
                }
            }
            AppCommand::OpenApp { app_id, params } => {
                if let Err(err) = self.launch_window(app_id, params).await {
                    logging::warn!("launch requested by window {} failed: {err}", window_id.0);
                }
            }
            AppCommand::CloseWindow => {
                if let Err(err) = self.close_window_inner(window_id).await {
                    logging::warn!("window {} could not close itself: {err}", window_id.0);
                }
            }
            AppCommand::Notify { title, body } => self.notify(&title, &body).await,
        }
    }

    async fn handle_vfs_change(&mut self, change: VfsChange) {
        if change.dir_path() == DESKTOP_DIR {
            self.refresh_desktop_icons().await;
        }
        let pending: Vec<_> = self
            .apps
            .instances_mut()
            .filter_map(|instance| instance.on_vfs_change(&change))
            .collect();
        join_all(pending).await;
    }

    pub(crate) async fn notify(&self, title: &str, body: &str) {
        if let Err(err) = self.host.notifications.notify(title, body).await {
            logging::warn!("notification `{title}` was not delivered: {err}");
        }
    }

    /// Rebuilds the icon set from the registry and `/Desktop/`, then runs the layout pass.
    ///
    /// Current positions survive as long as the desktop width stays within the invalidation
    /// tolerance; persisted positions are used under the same rule.
    pub(crate) async fn refresh_desktop_icons(&mut self) {
        let items = if self.host.vfs.is_ready() {
            match self.host.vfs.list_directory(DESKTOP_DIR).await {
                Ok(items) => items,
                Err(err) => {
                    logging::warn!("listing {DESKTOP_DIR} failed: {err}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let mut icons = build_desktop_icons(self.registry.registrations(), &items);

        let config = self.state.config.clone();
        let viewport = self.state.viewport;
        let tolerance = config.layout_invalidate_tolerance_px;
        let mut known =
            persistence::load_icon_layout(self.host.prefs.as_ref(), viewport.width, tolerance)
                .await;
        if self
            .layout_width
            .is_some_and(|width| (width - viewport.width).abs() <= tolerance)
        {
            for icon in &self.state.icons {
                known.insert(icon.id.clone(), icon.position);
            }
        }

        let metrics = config.grid();
        let extents = DesktopExtents::for_viewport(
            &metrics,
            viewport,
            config.taskbar_height,
            config.narrow_breakpoint,
        );
        let positions = layout_pass(&icons, &known, metrics, extents, config.max_search_radius);
        for icon in &mut icons {
            if let Some(position) = positions.get(&icon.id) {
                icon.position = *position;
            }
        }

        if let Err(err) = self.apply(DesktopAction::SetDesktopIcons { icons }) {
            logging::error!("desktop icon refresh rejected: {err}");
            return;
        }
        self.layout_width = Some(viewport.width);
        self.persist_icon_layout().await;
    }

    pub(crate) async fn persist_icon_layout(&self) {
        if let Err(err) = persistence::persist_icon_layout(
            self.host.prefs.as_ref(),
            &self.state.icons,
            self.state.viewport.width,
        )
        .await
        {
            logging::warn!("icon layout was not saved: {err}");
        }
    }
}
