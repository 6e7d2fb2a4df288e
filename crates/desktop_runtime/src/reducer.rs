//! Reducer actions, side-effect intents, and transition logic for the desktop runtime.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{
    icons::{next_icon_index, IconNavKey},
    interaction::{
        exceeds_threshold, snap_rect, snap_zone_for, IconDragSession, IconTap, InteractionState,
        PointerSession, WindowDragSession, WindowResizeSession,
    },
    model::{
        DesktopIcon, DesktopState, IconKind, IconPosition, OpenWindowRequest, PointerInput,
        PointerKind, PointerPosition, ResizeEdge, SnapTarget, WindowId, WindowPhase, WindowRecord,
        WindowRect,
    },
    placement::{find_next_available_cell, icons_per_row, DesktopExtents, PlacementContext},
    window_manager::{
        clamp_to_visible, fallback_restore_rect, find_window_mut, focus_window_internal,
        initial_window_rect, next_window_id, normalize_window_stack, resize_rect,
    },
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Allocate a window in the `Opening` phase and focus it.
    OpenWindow(OpenWindowRequest),
    /// The app instance has been attached to its window.
    WindowMounted { window_id: WindowId },
    /// Drop a window whose launch failed before it was mounted.
    DiscardWindow { window_id: WindowId },
    FocusWindow { window_id: WindowId },
    MinimizeWindow {
        window_id: WindowId,
        /// Inner element that had focus, refocused on restore.
        focus_target: Option<String>,
    },
    /// Un-hide a minimized window, or un-maximize a maximized one.
    RestoreWindow { window_id: WindowId },
    ToggleMaximize { window_id: WindowId },
    TitleBarDoubleClick { window_id: WindowId },
    /// Taskbar button: restore if minimized, minimize if focused, otherwise focus.
    ToggleTaskbarWindow { window_id: WindowId },
    /// Enter the `Closing` phase while the close hook runs.
    BeginClose { window_id: WindowId },
    /// The close hook vetoed; return to the phase the window had before.
    CancelClose { window_id: WindowId },
    /// Remove the window and hand focus to the next one.
    FinishClose { window_id: WindowId },
    SetWindowTitle { window_id: WindowId, title: String },
    SetViewport { width: i32, height: i32 },
    /// Replace the icon set (positions already resolved by the layout pass).
    SetDesktopIcons { icons: Vec<DesktopIcon> },
    /// Pointer-down on empty desktop.
    ClearIconSelection,
    /// Secondary click on an icon.
    IconContextMenu { icon_id: String },
    /// Arrow/Home/End on the focused desktop.
    IconKeyDown { key: IconNavKey },
    /// Enter on the focused desktop.
    OpenSelectedIcon,
    TitleBarPointerDown {
        window_id: WindowId,
        input: PointerInput,
    },
    ResizeHandlePointerDown {
        window_id: WindowId,
        edge: ResizeEdge,
        input: PointerInput,
    },
    IconPointerDown { icon_id: String, input: PointerInput },
    PointerMove { input: PointerInput },
    PointerUp { input: PointerInput },
    PointerCancel { pointer_id: i32 },
    /// The long-press timer armed by [`RuntimeEffect::ArmLongPress`] fired.
    LongPressElapsed { icon_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Grabbing,
    Resize(ResizeEdge),
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the runtime to execute.
pub enum RuntimeEffect {
    /// Move focus into a window: the remembered element, or its content region when `None`.
    FocusWindowInput {
        window_id: WindowId,
        target: Option<String>,
    },
    /// Persist the current icon positions.
    PersistIconLayout,
    /// Re-read `/Desktop/` and rerun the icon layout pass.
    RefreshDesktopIcons,
    OpenIcon { icon_id: String },
    ShowIconContextMenu { icon_id: String },
    /// Start a long-press timer that reports back with [`DesktopAction::LongPressElapsed`].
    ArmLongPress { icon_id: String, delay_ms: u64 },
    CancelLongPress,
    SetCursor(CursorStyle),
    CapturePointer { pointer_id: i32 },
    ReleasePointer { pointer_id: i32 },
    /// Move the dragged item into the folder it was dropped on.
    MoveIntoFolder {
        icon_id: String,
        source_path: String,
        folder_path: String,
    },
    /// Show (`Some`) or hide (`None`) the snap preview rectangle.
    ShowSnapPreview(Option<WindowRect>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for invalid actions (for example, referencing a missing window).
pub enum ReducerError {
    /// The target window id was not found in the current state.
    #[error("window not found")]
    WindowNotFound,
    /// The target icon id was not found in the current state.
    #[error("icon not found")]
    IconNotFound,
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting side effects.
///
/// This function is the authoritative state transition engine for window management and the
/// pointer-session state machine. It never performs I/O; every outward consequence is returned as
/// a [`RuntimeEffect`].
///
/// # Errors
///
/// Returns [`ReducerError::WindowNotFound`] or [`ReducerError::IconNotFound`] when an action
/// references a window or icon that is not present.
pub fn reduce_desktop(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(req) => {
            let window_id = next_window_id(state);
            let (rect, forced_maximized) =
                initial_window_rect(req.size, state.windows.len(), state.viewport, &state.config);
            state.windows.push(WindowRecord {
                id: window_id,
                app_id: req.app_id,
                title: req.title,
                glyph: req.glyph,
                rect,
                restore_rect: None,
                z_index: 0,
                is_focused: false,
                minimized: false,
                maximized: forced_maximized,
                forced_maximized,
                snapped: false,
                modal: req.modal,
                flags: req.flags,
                phase: WindowPhase::Opening,
                last_focus_target: None,
                launch_params: req.launch_params,
            });
            focus_window_internal(state, window_id)?;
        }
        DesktopAction::WindowMounted { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if window.phase == WindowPhase::Opening {
                window.phase = window.settled_phase();
            }
            if window.flags.auto_focus_content && window.is_focused {
                effects.push(RuntimeEffect::FocusWindowInput {
                    window_id,
                    target: None,
                });
            }
        }
        DesktopAction::DiscardWindow { window_id } => {
            remove_window(state, window_id)?;
        }
        DesktopAction::FocusWindow { window_id } => {
            let window = find_window_mut(state, window_id)?;
            let target = if window.minimized {
                window.last_focus_target.take()
            } else {
                None
            };
            focus_window_internal(state, window_id)?;
            effects.push(RuntimeEffect::FocusWindowInput { window_id, target });
        }
        DesktopAction::MinimizeWindow {
            window_id,
            focus_target,
        } => {
            let window = find_window_mut(state, window_id)?;
            if !window.minimized {
                window.minimized = true;
                window.is_focused = false;
                window.last_focus_target = focus_target;
                normalize_window_stack(state);
                push_focus_of_top(state, &mut effects);
            }
        }
        DesktopAction::RestoreWindow { window_id } => {
            let work_area = state.work_area();
            let window = find_window_mut(state, window_id)?;
            if window.minimized {
                window.minimized = false;
            } else if window.maximized && !window.forced_maximized {
                window.rect = window
                    .restore_rect
                    .take()
                    .unwrap_or_else(|| fallback_restore_rect(work_area));
                window.maximized = false;
            }
            let target = window.last_focus_target.take();
            focus_window_internal(state, window_id)?;
            effects.push(RuntimeEffect::FocusWindowInput { window_id, target });
        }
        DesktopAction::ToggleMaximize { window_id }
        | DesktopAction::TitleBarDoubleClick { window_id } => {
            let work_area = state.work_area();
            let window = find_window_mut(state, window_id)?;
            if window.forced_maximized || !window.flags.maximizable {
                return Ok(effects);
            }
            if window.maximized {
                window.rect = window
                    .restore_rect
                    .take()
                    .unwrap_or_else(|| fallback_restore_rect(work_area));
                window.maximized = false;
            } else {
                window.restore_rect = Some(window.rect);
                window.rect = work_area;
                window.maximized = true;
                window.snapped = false;
            }
            focus_window_internal(state, window_id)?;
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            let focused = state.focused_window_id() == Some(window_id);
            let minimized = state
                .window(window_id)
                .map(|w| w.minimized)
                .ok_or(ReducerError::WindowNotFound)?;
            let next = if minimized {
                DesktopAction::RestoreWindow { window_id }
            } else if focused {
                DesktopAction::MinimizeWindow {
                    window_id,
                    focus_target: None,
                }
            } else {
                DesktopAction::FocusWindow { window_id }
            };
            effects.extend(reduce_desktop(state, interaction, next)?);
        }
        DesktopAction::BeginClose { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if !window.is_closing() {
                window.phase = WindowPhase::Closing;
            }
        }
        DesktopAction::CancelClose { window_id } => {
            let window = find_window_mut(state, window_id)?;
            if window.is_closing() {
                window.phase = window.settled_phase();
            }
        }
        DesktopAction::FinishClose { window_id } => {
            if interaction.session.window_id() == Some(window_id) {
                interaction.session = PointerSession::Idle;
                finish_session(interaction, None, &mut effects);
            }
            let was_focused = state.focused_window_id() == Some(window_id);
            remove_window(state, window_id)?;
            if was_focused {
                push_focus_of_top(state, &mut effects);
            }
        }
        DesktopAction::SetWindowTitle { window_id, title } => {
            find_window_mut(state, window_id)?.title = title;
        }
        DesktopAction::SetViewport { width, height } => {
            let previous_width = state.viewport.width;
            state.viewport.width = width.max(0);
            state.viewport.height = height.max(0);
            let work_area = state.work_area();
            for window in state.windows.iter_mut().filter(|w| w.maximized) {
                window.rect = work_area;
            }
            if (state.viewport.width - previous_width).abs()
                > state.config.layout_invalidate_tolerance_px
            {
                effects.push(RuntimeEffect::RefreshDesktopIcons);
            }
        }
        DesktopAction::SetDesktopIcons { icons } => {
            state.icons = icons;
            if let Some(active) = state.active_icon.as_deref() {
                if state.icon(active).is_none() {
                    state.active_icon = None;
                }
            }
        }
        DesktopAction::ClearIconSelection => {
            state.active_icon = None;
        }
        DesktopAction::IconContextMenu { icon_id } => {
            if state.icon(&icon_id).is_none() {
                return Err(ReducerError::IconNotFound);
            }
            state.active_icon = Some(icon_id.clone());
            effects.push(RuntimeEffect::ShowIconContextMenu { icon_id });
        }
        DesktopAction::IconKeyDown { key } => {
            let current = state
                .active_icon
                .as_deref()
                .and_then(|active| state.icons.iter().position(|icon| icon.id == active));
            let per_row = icons_per_row(
                &state.config.grid(),
                state.viewport.width,
                state.config.narrow_breakpoint,
            );
            if let Some(next) = next_icon_index(current, state.icons.len(), per_row as usize, key) {
                state.active_icon = state.icons.get(next).map(|icon| icon.id.clone());
            }
        }
        DesktopAction::OpenSelectedIcon => {
            if let Some(icon_id) = state.active_icon.clone() {
                effects.push(RuntimeEffect::OpenIcon { icon_id });
            }
        }
        DesktopAction::TitleBarPointerDown { window_id, input } => {
            focus_window_internal(state, window_id)?;
            let window = find_window_mut(state, window_id)?;
            let draggable = !window.maximized && !window.forced_maximized && !window.is_closing();
            if draggable && input.can_drag() && interaction.session.is_idle() {
                window.snapped = false;
                interaction.session = PointerSession::ActiveWindowDrag(WindowDragSession {
                    window_id,
                    pointer_id: input.pointer_id,
                    origin: window.rect,
                    pointer_origin: input.position,
                });
                effects.push(RuntimeEffect::SetCursor(CursorStyle::Grabbing));
                effects.push(RuntimeEffect::CapturePointer {
                    pointer_id: input.pointer_id,
                });
            }
        }
        DesktopAction::ResizeHandlePointerDown {
            window_id,
            edge,
            input,
        } => {
            focus_window_internal(state, window_id)?;
            let window = find_window_mut(state, window_id)?;
            let resizable = window.flags.resizable
                && !window.maximized
                && !window.forced_maximized
                && !window.is_closing();
            if resizable && input.can_drag() && interaction.session.is_idle() {
                window.snapped = false;
                interaction.session = PointerSession::ActiveWindowResize(WindowResizeSession {
                    window_id,
                    pointer_id: input.pointer_id,
                    edge,
                    origin: window.rect,
                    pointer_origin: input.position,
                });
                effects.push(RuntimeEffect::SetCursor(CursorStyle::Resize(edge)));
                effects.push(RuntimeEffect::CapturePointer {
                    pointer_id: input.pointer_id,
                });
            }
        }
        DesktopAction::IconPointerDown { icon_id, input } => {
            icon_pointer_down(state, interaction, icon_id, input, &mut effects)?;
        }
        DesktopAction::PointerMove { input } => {
            if interaction.session.accepts(input.pointer_id) {
                pointer_move(state, interaction, input, &mut effects)?;
            }
        }
        DesktopAction::PointerUp { input } => {
            if interaction.session.accepts(input.pointer_id) {
                pointer_up(state, interaction, input, &mut effects);
            }
        }
        DesktopAction::PointerCancel { pointer_id } => {
            if interaction.session.accepts(pointer_id) {
                restore_session_origin(state, std::mem::take(&mut interaction.session));
                finish_session(interaction, Some(pointer_id), &mut effects);
            }
        }
        DesktopAction::LongPressElapsed { icon_id } => {
            if interaction.long_press_icon.as_deref() == Some(icon_id.as_str()) {
                interaction.long_press_icon = None;
                if matches!(
                    &interaction.session,
                    PointerSession::PendingIconDrag(session) if session.icon_id == icon_id
                ) {
                    interaction.session = PointerSession::Idle;
                }
                interaction.last_icon_tap = None;
                state.active_icon = Some(icon_id.clone());
                effects.push(RuntimeEffect::ShowIconContextMenu { icon_id });
            }
        }
    }

    normalize_window_stack(state);
    Ok(effects)
}

fn remove_window(state: &mut DesktopState, window_id: WindowId) -> Result<(), ReducerError> {
    let before_len = state.windows.len();
    state.windows.retain(|w| w.id != window_id);
    if state.windows.len() == before_len {
        return Err(ReducerError::WindowNotFound);
    }
    normalize_window_stack(state);
    Ok(())
}

fn push_focus_of_top(state: &DesktopState, effects: &mut Vec<RuntimeEffect>) {
    if let Some(window_id) = state.focused_window_id() {
        effects.push(RuntimeEffect::FocusWindowInput {
            window_id,
            target: None,
        });
    }
}

fn icon_pointer_down(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    icon_id: String,
    input: PointerInput,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    let origin = state
        .icon(&icon_id)
        .map(|icon| icon.position)
        .ok_or(ReducerError::IconNotFound)?;
    state.active_icon = Some(icon_id.clone());
    if !input.can_drag() || !interaction.session.is_idle() {
        return Ok(());
    }

    let double_click_ms = state.config.double_click_ms;
    let is_double = interaction.last_icon_tap.as_ref().is_some_and(|tap| {
        tap.icon_id == icon_id && input.time_ms.saturating_sub(tap.time_ms) <= double_click_ms
    });
    if is_double {
        interaction.last_icon_tap = None;
        if interaction.long_press_icon.take().is_some() {
            effects.push(RuntimeEffect::CancelLongPress);
        }
        effects.push(RuntimeEffect::OpenIcon { icon_id });
        return Ok(());
    }

    interaction.last_icon_tap = Some(IconTap {
        icon_id: icon_id.clone(),
        time_ms: input.time_ms,
    });
    interaction.session = PointerSession::PendingIconDrag(IconDragSession {
        icon_id: icon_id.clone(),
        pointer_id: input.pointer_id,
        pointer_kind: input.kind,
        origin,
        pointer_origin: input.position,
    });
    if input.kind == PointerKind::Touch {
        interaction.long_press_icon = Some(icon_id.clone());
        effects.push(RuntimeEffect::ArmLongPress {
            icon_id,
            delay_ms: state.config.long_press_ms,
        });
    }
    Ok(())
}

fn pointer_move(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    input: PointerInput,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<(), ReducerError> {
    let pointer = input.position;
    match &interaction.session {
        PointerSession::Idle => {}
        PointerSession::PendingIconDrag(session) => {
            if !exceeds_threshold(session.pointer_origin, pointer, state.config.drag_threshold_px)
            {
                return Ok(());
            }
            let session = session.clone();
            if interaction.long_press_icon.take().is_some() {
                effects.push(RuntimeEffect::CancelLongPress);
            }
            interaction.last_icon_tap = None;
            effects.push(RuntimeEffect::CapturePointer {
                pointer_id: input.pointer_id,
            });
            effects.push(RuntimeEffect::SetCursor(CursorStyle::Grabbing));
            move_icon(state, &session, pointer)?;
            interaction.session = PointerSession::ActiveIconDrag(session);
        }
        PointerSession::ActiveIconDrag(session) => {
            move_icon(state, session, pointer)?;
        }
        PointerSession::ActiveWindowDrag(session) => {
            let rect = session.follow(pointer);
            let window = find_window_mut(state, session.window_id)?;
            window.rect = rect;
            let forced = window.forced_maximized;
            let snap = if state.viewport.width >= state.config.snap_disable_width && !forced {
                snap_zone_for(pointer, state.viewport.width, state.config.snap_zone_px)
            } else {
                None
            };
            if snap != interaction.snap_target {
                interaction.snap_target = snap;
                let work_area = state.work_area();
                effects.push(RuntimeEffect::ShowSnapPreview(
                    snap.map(|target| snap_rect(target, work_area)),
                ));
            }
        }
        PointerSession::ActiveWindowResize(session) => {
            let dx = pointer.x - session.pointer_origin.x;
            let dy = pointer.y - session.pointer_origin.y;
            let rect = resize_rect(
                session.origin,
                session.edge,
                dx,
                dy,
                state.config.min_window_width,
                state.config.min_window_height,
            );
            find_window_mut(state, session.window_id)?.rect = rect;
        }
    }
    Ok(())
}

fn move_icon(
    state: &mut DesktopState,
    session: &IconDragSession,
    pointer: PointerPosition,
) -> Result<(), ReducerError> {
    let follow = session.follow(pointer);
    let work_area = state.work_area();
    let max_x = (state.viewport.width - state.config.icon_width).max(0);
    let max_y = (work_area.h - state.config.icon_visual_height).max(0);
    let icon = state
        .icons
        .iter_mut()
        .find(|icon| icon.id == session.icon_id)
        .ok_or(ReducerError::IconNotFound)?;
    icon.position = IconPosition {
        x: follow.x.clamp(0, max_x),
        y: follow.y.clamp(0, max_y),
    };
    Ok(())
}

fn pointer_up(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    input: PointerInput,
    effects: &mut Vec<RuntimeEffect>,
) {
    match std::mem::take(&mut interaction.session) {
        PointerSession::Idle | PointerSession::PendingIconDrag(_) => {}
        PointerSession::ActiveIconDrag(session) => drop_icon(state, &session, input, effects),
        PointerSession::ActiveWindowDrag(session) => {
            let snap = interaction.snap_target;
            let work_area = state.work_area();
            let viewport = state.viewport;
            let config = &state.config;
            if let Some(window) = state.windows.iter_mut().find(|w| w.id == session.window_id) {
                match snap {
                    Some(target) => {
                        window.restore_rect = Some(session.origin);
                        window.rect = snap_rect(target, work_area);
                        window.maximized = target == SnapTarget::Top;
                        window.snapped = target != SnapTarget::Top;
                    }
                    None => window.rect = clamp_to_visible(window.rect, viewport, config),
                }
            }
        }
        PointerSession::ActiveWindowResize(_) => {}
    }
    finish_session(interaction, Some(input.pointer_id), effects);
}

fn drop_icon(
    state: &mut DesktopState,
    session: &IconDragSession,
    input: PointerInput,
    effects: &mut Vec<RuntimeEffect>,
) {
    let Some(dragged) = state.icon(&session.icon_id).cloned() else {
        return;
    };

    let icon_w = state.config.icon_width;
    let icon_h = state.config.icon_visual_height;
    let folder_target = state
        .icons
        .iter()
        .filter(|icon| icon.id != dragged.id && icon.kind == IconKind::Folder)
        .find(|icon| {
            WindowRect {
                x: icon.position.x,
                y: icon.position.y,
                w: icon_w,
                h: icon_h,
            }
            .contains(input.position)
        })
        .and_then(|icon| icon.backing_path.clone());

    if let (Some(folder_path), Some(source_path)) = (folder_target, dragged.backing_path.clone()) {
        set_icon_position(state, &dragged.id, session.origin);
        effects.push(RuntimeEffect::MoveIntoFolder {
            icon_id: dragged.id,
            source_path,
            folder_path,
        });
        return;
    }

    let metrics = state.config.grid();
    let extents = DesktopExtents::for_viewport(
        &metrics,
        state.viewport,
        state.config.taskbar_height,
        state.config.narrow_breakpoint,
    );
    let occupied: BTreeMap<String, IconPosition> = state
        .icons
        .iter()
        .map(|icon| (icon.id.clone(), icon.position))
        .collect();
    let context = PlacementContext {
        metrics,
        extents,
        max_search_radius: state.config.max_search_radius,
        persisted: &occupied,
    };
    let search =
        find_next_available_cell(&context, dragged.position, &dragged.id, &BTreeSet::new());
    set_icon_position(state, &dragged.id, search.position());
    effects.push(RuntimeEffect::PersistIconLayout);
}

fn set_icon_position(state: &mut DesktopState, icon_id: &str, position: IconPosition) {
    if let Some(icon) = state.icons.iter_mut().find(|icon| icon.id == icon_id) {
        icon.position = position;
    }
}

fn restore_session_origin(state: &mut DesktopState, session: PointerSession) {
    match session {
        PointerSession::Idle => {}
        PointerSession::PendingIconDrag(session) | PointerSession::ActiveIconDrag(session) => {
            set_icon_position(state, &session.icon_id, session.origin);
        }
        PointerSession::ActiveWindowDrag(WindowDragSession {
            window_id, origin, ..
        })
        | PointerSession::ActiveWindowResize(WindowResizeSession {
            window_id, origin, ..
        }) => {
            if let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) {
                window.rect = origin;
            }
        }
    }
}

/// Shared teardown for release and cancel. The session must already be idle.
fn finish_session(
    interaction: &mut InteractionState,
    pointer_id: Option<i32>,
    effects: &mut Vec<RuntimeEffect>,
) {
    if interaction.long_press_icon.take().is_some() {
        effects.push(RuntimeEffect::CancelLongPress);
    }
    if interaction.snap_target.take().is_some() {
        effects.push(RuntimeEffect::ShowSnapPreview(None));
    }
    effects.push(RuntimeEffect::SetCursor(CursorStyle::Default));
    if let Some(pointer_id) = pointer_id {
        effects.push(RuntimeEffect::ReleasePointer { pointer_id });
    }
}
