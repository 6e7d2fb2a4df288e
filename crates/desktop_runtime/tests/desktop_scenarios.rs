use std::{any::Any, cell::RefCell, rc::Rc};

use desktop_app_contract::{
    AppInstance, AppLaunchContext, AppLifecycleEvent, AppRegistration, ApplicationId, LaunchError,
    Launchable,
};
use desktop_runtime::{
    apps::{self, ErrorApp, ExplorerApp, NotepadApp, SandboxedHtmlApp},
    icons::{app_icon_id, desktop_icon_id_for_path},
    load_icon_layout, DesktopAction, DesktopRuntime, IconPosition, PointerInput, RuntimeError,
    Viewport, WindowId, WindowPhase,
};
use futures::executor::block_on;
use platform_host::{
    DialogAnswer, HostServices, MemoryNotificationService, MemoryPrefsStore, MemoryVfsStore,
    ScriptedDialogService, VfsService, RECYCLE_BIN_DIR,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

struct Harness {
    runtime: DesktopRuntime,
    dialogs: ScriptedDialogService,
    notifications: MemoryNotificationService,
}

fn unbooted() -> Harness {
    let dialogs = ScriptedDialogService::default();
    let notifications = MemoryNotificationService::default();
    let host = HostServices::new(
        Rc::new(MemoryPrefsStore::default()),
        Rc::new(notifications.clone()),
        Rc::new(dialogs.clone()),
        VfsService::new(Rc::new(MemoryVfsStore::default())),
    );
    Harness {
        runtime: DesktopRuntime::new(host),
        dialogs,
        notifications,
    }
}

fn booted() -> Harness {
    let mut harness = unbooted();
    block_on(harness.runtime.boot(Viewport::default())).expect("boot");
    harness
}

fn icon_position(runtime: &DesktopRuntime, icon_id: &str) -> IconPosition {
    runtime.state().icon(icon_id).expect("icon").position
}

/// Press, move and release pointer 1, starting at `at_ms`. Gestures must be spaced apart further
/// than the double-click window.
fn drag_icon(
    runtime: &mut DesktopRuntime,
    icon_id: &str,
    from: (i32, i32),
    to: (i32, i32),
    at_ms: u64,
) {
    block_on(runtime.dispatch(DesktopAction::IconPointerDown {
        icon_id: icon_id.to_string(),
        input: PointerInput::mouse(1, from.0, from.1, at_ms),
    }))
    .expect("down");
    block_on(runtime.dispatch(DesktopAction::PointerMove {
        input: PointerInput::mouse(1, to.0, to.1, at_ms + 50),
    }))
    .expect("move");
    block_on(runtime.dispatch(DesktopAction::PointerUp {
        input: PointerInput::mouse(1, to.0, to.1, at_ms + 100),
    }))
    .expect("up");
}

#[derive(Default)]
struct Probe {
    events: Rc<RefCell<Vec<AppLifecycleEvent>>>,
    allow_close: Rc<RefCell<bool>>,
}

impl AppInstance for Probe {
    fn on_lifecycle(&mut self, event: AppLifecycleEvent) {
        self.events.borrow_mut().push(event);
    }

    fn on_close(&mut self) -> Option<futures::future::LocalBoxFuture<'static, bool>> {
        let allow = *self.allow_close.borrow();
        Some(Box::pin(async move { allow }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Clone, Default)]
struct ProbeLauncher {
    events: Rc<RefCell<Vec<AppLifecycleEvent>>>,
    allow_close: Rc<RefCell<bool>>,
}

impl Launchable for ProbeLauncher {
    fn launch(&self, _context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
        Ok(Box::new(Probe {
            events: Rc::clone(&self.events),
            allow_close: Rc::clone(&self.allow_close),
        }))
    }
}

struct BrokenLauncher;

impl Launchable for BrokenLauncher {
    fn launch(&self, context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
        Err(LaunchError::Failed {
            app_id: context.app_id.to_string(),
            reason: "missing assets".to_string(),
        })
    }
}

fn register_probe(runtime: &mut DesktopRuntime) -> (ApplicationId, ProbeLauncher) {
    let app_id = ApplicationId::trusted("test.probe");
    let launcher = ProbeLauncher::default();
    runtime.registry_mut().register(
        AppRegistration::new(app_id.clone(), "Probe", "🧪"),
        Rc::new(launcher.clone()),
    );
    (app_id, launcher)
}

#[test]
fn boot_places_app_shortcuts_on_distinct_cells() {
    let harness = booted();
    let state = harness.runtime.state();

    for app_id in [apps::notepad_id(), apps::explorer_id(), apps::recycle_bin_id()] {
        assert!(state.icon(&app_icon_id(&app_id)).is_some(), "{app_id}");
    }
    assert!(state.icon(&app_icon_id(&apps::about_id())).is_none());

    let mut positions: Vec<IconPosition> = state.icons.iter().map(|icon| icon.position).collect();
    positions.sort();
    positions.dedup();
    assert_eq!(positions.len(), state.icons.len());
    assert_eq!(state.icons[0].position, IconPosition { x: 10, y: 10 });
}

#[test]
fn creating_an_existing_base_folder_returns_it() {
    let harness = booted();
    let vfs = &harness.runtime.host().vfs;

    let folder = block_on(vfs.create_folder("/Documents/")).expect("create folder");
    assert_eq!(folder.path, "/Documents/");

    let documents = block_on(vfs.list_directory("/"))
        .expect("list root")
        .into_iter()
        .filter(|item| item.path == "/Documents/")
        .count();
    assert_eq!(documents, 1);
}

#[test]
fn file_written_to_desktop_gains_an_icon() {
    let mut harness = booted();
    let vfs = harness.runtime.host().vfs.clone();

    block_on(vfs.create_file("/Desktop/note.txt", "hello", false)).expect("create");
    let item = block_on(vfs.get_item("/Desktop/note.txt"))
        .expect("get")
        .expect("present");
    assert_eq!(item.size(), Some(5));

    block_on(harness.runtime.settle());
    let icon_id = desktop_icon_id_for_path("/Desktop/note.txt");
    let icon = harness.runtime.state().icon(&icon_id).expect("icon");
    assert_eq!(icon.label, "note.txt");
    assert_eq!(icon.backing_path.as_deref(), Some("/Desktop/note.txt"));
}

#[test]
fn look_alike_file_names_get_their_own_icons() {
    let mut harness = booted();
    let vfs = harness.runtime.host().vfs.clone();
    block_on(vfs.create_file("/Desktop/a.txt", "dot", false)).expect("create a.txt");
    block_on(vfs.create_file("/Desktop/a_txt", "underscore", false)).expect("create a_txt");
    block_on(harness.runtime.settle());

    let dotted = desktop_icon_id_for_path("/Desktop/a.txt");
    let underscored = desktop_icon_id_for_path("/Desktop/a_txt");
    assert_ne!(dotted, underscored);
    assert_eq!(
        harness
            .runtime
            .state()
            .icon(&underscored)
            .and_then(|icon| icon.backing_path.as_deref()),
        Some("/Desktop/a_txt")
    );
    assert_ne!(
        icon_position(&harness.runtime, &dotted),
        icon_position(&harness.runtime, &underscored)
    );

    assert_eq!(
        block_on(harness.runtime.delete_icon(&underscored, true)),
        Ok(true)
    );
    assert!(block_on(vfs.get_item("/Desktop/a.txt")).expect("get").is_some());
    assert_eq!(block_on(vfs.get_item("/Desktop/a_txt")).expect("get"), None);
}

#[test]
fn deleting_an_icon_recycles_its_file() {
    let mut harness = booted();
    let path = block_on(harness.runtime.create_desktop_text_file("note", false)).expect("create");
    assert_eq!(path, "/Desktop/note.txt");
    let icon_id = desktop_icon_id_for_path(&path);

    assert_eq!(
        block_on(harness.runtime.delete_icon(&icon_id, false)),
        Ok(false)
    );
    assert!(harness.runtime.state().icon(&icon_id).is_some());

    assert_eq!(block_on(harness.runtime.delete_icon(&icon_id, true)), Ok(true));
    let vfs = harness.runtime.host().vfs.clone();
    assert_eq!(block_on(vfs.get_item(&path)).expect("get"), None);
    let recycled = block_on(vfs.list_directory(RECYCLE_BIN_DIR)).expect("list bin");
    assert_eq!(recycled.len(), 1);
    assert!(recycled[0].path.starts_with("/Recycle Bin/note.txt_"));
    assert_eq!(
        recycled[0]
            .recycled
            .as_ref()
            .map(|tag| tag.original_path.as_str()),
        Some("/Desktop/note.txt")
    );
    assert!(harness.runtime.state().icon(&icon_id).is_none());
}

#[test]
fn app_shortcuts_cannot_be_deleted() {
    let mut harness = booted();
    let icon_id = app_icon_id(&apps::notepad_id());

    assert_eq!(
        block_on(harness.runtime.delete_icon(&icon_id, true)),
        Err(RuntimeError::NotAFileIcon {
            icon_id: icon_id.clone()
        })
    );
    assert_eq!(harness.notifications.sent().len(), 1);
}

#[test]
fn renaming_a_folder_carries_its_contents() {
    let harness = booted();
    let vfs = &harness.runtime.host().vfs;
    block_on(vfs.create_folder("/Documents/Sub/")).expect("folder");
    block_on(vfs.create_file("/Documents/Sub/a.txt", "a", false)).expect("file");

    block_on(vfs.rename_item("/Documents/Sub/", "/Documents/Renamed/")).expect("rename");

    assert!(block_on(vfs.get_item("/Documents/Renamed/a.txt"))
        .expect("get")
        .is_some());
    assert!(block_on(vfs.get_item("/Documents/Sub/a.txt"))
        .expect("get")
        .is_none());
}

#[test]
fn renamed_desktop_icon_keeps_its_cell() {
    let mut harness = booted();
    let path = block_on(harness.runtime.create_desktop_text_file("draft", false)).expect("create");
    let before = icon_position(&harness.runtime, &desktop_icon_id_for_path(&path));

    let renamed = block_on(
        harness
            .runtime
            .rename_icon(&desktop_icon_id_for_path(&path), "final.txt"),
    )
    .expect("rename");

    assert_eq!(renamed, "/Desktop/final.txt");
    assert_eq!(
        icon_position(&harness.runtime, &desktop_icon_id_for_path(&renamed)),
        before
    );
    assert!(harness
        .runtime
        .state()
        .icon(&desktop_icon_id_for_path(&path))
        .is_none());
}

#[test]
fn icon_drag_respects_threshold_then_snaps_and_persists() {
    let mut harness = booted();
    let path = block_on(harness.runtime.create_desktop_text_file("note", false)).expect("create");
    let icon_id = desktop_icon_id_for_path(&path);
    let origin = icon_position(&harness.runtime, &icon_id);
    let grab = (origin.x + 30, origin.y + 30);

    drag_icon(&mut harness.runtime, &icon_id, grab, (grab.0 + 2, grab.1), 1_000);
    assert_eq!(icon_position(&harness.runtime, &icon_id), origin);

    drag_icon(&mut harness.runtime, &icon_id, grab, (grab.0 + 50, grab.1), 10_000);
    let cell_width = harness.runtime.state().config.grid().cell_width;
    let moved = IconPosition {
        x: origin.x + cell_width,
        y: origin.y,
    };
    assert_eq!(icon_position(&harness.runtime, &icon_id), moved);

    let stored = block_on(load_icon_layout(
        harness.runtime.host().prefs.as_ref(),
        Viewport::default().width,
        50,
    ));
    assert_eq!(stored.get(&icon_id), Some(&moved));
}

#[test]
fn dropping_a_file_on_a_folder_moves_it_inside() {
    let mut harness = booted();
    let folder = block_on(harness.runtime.create_desktop_folder("Projects")).expect("folder");
    let file = block_on(harness.runtime.create_desktop_text_file("a", false)).expect("file");
    let file_icon = desktop_icon_id_for_path(&file);
    let from = icon_position(&harness.runtime, &file_icon);
    let to = icon_position(&harness.runtime, &desktop_icon_id_for_path(&folder));

    drag_icon(
        &mut harness.runtime,
        &file_icon,
        (from.x + 30, from.y + 30),
        (to.x + 30, to.y + 30),
        1_000,
    );

    let vfs = harness.runtime.host().vfs.clone();
    assert!(block_on(vfs.get_item("/Desktop/Projects/a.txt"))
        .expect("get")
        .is_some());
    assert!(harness.runtime.state().icon(&file_icon).is_none());
}

#[test]
fn title_bar_double_click_maximizes_and_restores_geometry() {
    let mut harness = booted();
    let window_id =
        block_on(harness.runtime.open_app(apps::notepad_id(), Value::Null)).expect("open");
    let before = harness.runtime.state().window(window_id).expect("window").rect;

    block_on(
        harness
            .runtime
            .dispatch(DesktopAction::TitleBarDoubleClick { window_id }),
    )
    .expect("maximize");
    let maximized = harness.runtime.state().window(window_id).expect("window");
    assert!(maximized.maximized);
    assert_eq!(maximized.rect, harness.runtime.state().work_area());

    block_on(
        harness
            .runtime
            .dispatch(DesktopAction::TitleBarDoubleClick { window_id }),
    )
    .expect("restore");
    let restored = harness.runtime.state().window(window_id).expect("window");
    assert!(!restored.maximized);
    assert_eq!(restored.rect, before);
}

#[test]
fn vetoed_close_leaves_the_window_untouched() {
    let mut harness = booted();
    block_on(harness.runtime.open_app(apps::explorer_id(), json!({ "initialPath": "/" })))
        .expect("explorer");
    let notepad =
        block_on(harness.runtime.open_app(apps::notepad_id(), Value::Null)).expect("notepad");
    harness
        .runtime
        .app::<NotepadApp>(notepad)
        .expect("notepad app")
        .set_content("unsaved words");
    block_on(harness.runtime.settle());
    let before = harness.runtime.state().windows.clone();

    harness.dialogs.push(DialogAnswer::Confirm(false));
    assert_eq!(block_on(harness.runtime.close_window(notepad)), Ok(false));

    assert_eq!(harness.runtime.state().windows, before);
    assert_eq!(
        harness.dialogs.asked(),
        vec![
            "Notepad: Untitled.txt - Notepad: You have unsaved changes. Are you sure you want to close?"
                .to_string()
        ]
    );
}

struct Quitter;

impl AppInstance for Quitter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Asks to close its window at launch, then sends a title for the window that is already gone.
struct QuitterLauncher;

impl Launchable for QuitterLauncher {
    fn launch(&self, context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
        context.services.send(desktop_app_contract::AppCommand::CloseWindow);
        context.services.set_title("too late");
        Ok(Box::new(Quitter))
    }
}

#[test]
fn commands_for_a_closed_window_are_dropped() {
    let mut harness = booted();
    let app_id = ApplicationId::trusted("test.quitter");
    harness.runtime.registry_mut().register(
        AppRegistration::new(app_id.clone(), "Quitter", "🚪"),
        Rc::new(QuitterLauncher),
    );

    let window_id = block_on(harness.runtime.open_app(app_id, Value::Null)).expect("open");

    assert!(harness.runtime.state().window(window_id).is_none());
    assert!(harness.runtime.lifecycle(window_id).is_none());
    let calculator =
        block_on(harness.runtime.open_app(apps::calculator_id(), Value::Null)).expect("calculator");
    assert!(harness.runtime.state().window(calculator).is_some());
}

#[test]
fn closing_hands_focus_back_and_ends_the_session() {
    let mut harness = booted();
    let (probe_id, launcher) = register_probe(&mut harness.runtime);
    *launcher.allow_close.borrow_mut() = true;

    let first = block_on(harness.runtime.open_app(probe_id.clone(), Value::Null)).expect("first");
    let second = block_on(harness.runtime.open_app(probe_id, Value::Null)).expect("second");
    assert_eq!(harness.runtime.state().focused_window_id(), Some(second));

    assert_eq!(block_on(harness.runtime.close_window(second)), Ok(true));
    assert!(harness.runtime.state().window(second).is_none());
    assert_eq!(harness.runtime.state().focused_window_id(), Some(first));
    assert_eq!(
        harness.runtime.lifecycle(first),
        Some(AppLifecycleEvent::Focused)
    );
    assert_eq!(harness.runtime.lifecycle(second), None);
    assert!(launcher
        .events
        .borrow()
        .ends_with(&[AppLifecycleEvent::Closing, AppLifecycleEvent::Closed, AppLifecycleEvent::Focused]));
}

#[test]
fn closing_twice_is_ignored_while_the_hook_runs() {
    let mut harness = booted();
    let (probe_id, _launcher) = register_probe(&mut harness.runtime);
    let window_id = block_on(harness.runtime.open_app(probe_id, Value::Null)).expect("open");

    block_on(
        harness
            .runtime
            .dispatch(DesktopAction::BeginClose { window_id }),
    )
    .expect("begin");
    assert_eq!(block_on(harness.runtime.close_window(window_id)), Ok(false));
    assert_eq!(
        harness.runtime.state().window(window_id).map(|w| w.phase),
        Some(WindowPhase::Closing)
    );
}

#[test]
fn minimize_and_restore_reach_the_app() {
    let mut harness = booted();
    let (probe_id, launcher) = register_probe(&mut harness.runtime);
    let window_id = block_on(harness.runtime.open_app(probe_id, Value::Null)).expect("open");

    block_on(harness.runtime.minimize(window_id, Some("editor".to_string()))).expect("minimize");
    assert_eq!(harness.runtime.state().focused_window_id(), None);
    block_on(harness.runtime.toggle_taskbar_window(window_id)).expect("restore");

    assert_eq!(
        *launcher.events.borrow(),
        vec![
            AppLifecycleEvent::Mounted,
            AppLifecycleEvent::Minimized,
            AppLifecycleEvent::Blurred,
            AppLifecycleEvent::Restored,
            AppLifecycleEvent::Focused,
        ]
    );
    assert!(harness
        .runtime
        .take_host_effects()
        .contains(&desktop_runtime::RuntimeEffect::FocusWindowInput {
            window_id,
            target: Some("editor".to_string()),
        }));
}

#[test]
fn file_system_apps_refuse_to_launch_before_init() {
    let mut harness = unbooted();

    assert_eq!(
        block_on(harness.runtime.open_app(apps::notepad_id(), Value::Null)),
        Err(RuntimeError::Launch(LaunchError::FileSystemUnavailable {
            app_id: apps::NOTEPAD_APP_ID.to_string()
        }))
    );
    assert!(harness.runtime.state().windows.is_empty());
    let sent = harness.notifications.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "File System");

    let calculator =
        block_on(harness.runtime.open_app(apps::calculator_id(), Value::Null)).expect("calculator");
    assert!(harness.runtime.state().window(calculator).is_some());
}

#[test]
fn unknown_app_opens_the_error_window() {
    let mut harness = booted();

    let window_id = block_on(
        harness
            .runtime
            .open_app(ApplicationId::trusted("system.missing"), Value::Null),
    )
    .expect("error window");

    let window = harness.runtime.state().window(window_id).expect("window");
    assert_eq!(window.app_id, apps::error_id());
    assert!(window.modal);
    let error = harness.runtime.app::<ErrorApp>(window_id).expect("error app");
    assert_eq!(error.errored_app_id(), "system.missing");
}

#[test]
fn failed_launch_discards_its_window_and_reports() {
    let mut harness = booted();
    let broken = ApplicationId::trusted("test.broken");
    harness.runtime.registry_mut().register(
        AppRegistration::new(broken.clone(), "Broken", "💥"),
        Rc::new(BrokenLauncher),
    );

    let window_id = block_on(harness.runtime.open_app(broken, Value::Null)).expect("error window");

    assert_eq!(harness.runtime.state().windows.len(), 1);
    assert_eq!(window_id, WindowId(2));
    assert_eq!(
        harness
            .runtime
            .app::<ErrorApp>(window_id)
            .map(ErrorApp::errored_app_id),
        Some("test.broken")
    );
}

#[test]
fn single_instance_apps_focus_their_window() {
    let mut harness = booted();
    let first =
        block_on(harness.runtime.open_app(apps::calculator_id(), Value::Null)).expect("first");
    block_on(harness.runtime.open_app(apps::about_id(), Value::Null)).expect("about");

    let again =
        block_on(harness.runtime.open_app(apps::calculator_id(), Value::Null)).expect("again");

    assert_eq!(again, first);
    assert_eq!(harness.runtime.state().windows.len(), 2);
    assert_eq!(harness.runtime.state().focused_window_id(), Some(first));
}

#[test]
fn explorer_follows_changes_to_its_folder() {
    let mut harness = booted();
    let explorer = block_on(
        harness
            .runtime
            .open_app(apps::explorer_id(), json!({ "initialPath": "/Desktop" })),
    )
    .expect("explorer");
    assert_eq!(
        harness
            .runtime
            .app::<ExplorerApp>(explorer)
            .expect("explorer app")
            .current_path(),
        "/Desktop/"
    );

    block_on(harness.runtime.create_desktop_text_file("todo", false)).expect("create");

    let names: Vec<String> = harness
        .runtime
        .app::<ExplorerApp>(explorer)
        .expect("explorer app")
        .items()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["todo.txt".to_string()]);
}

#[test]
fn opening_a_text_icon_launches_notepad_with_its_file() {
    let mut harness = booted();
    let vfs = harness.runtime.host().vfs.clone();
    block_on(vfs.create_file("/Desktop/readme.txt", "read me", false)).expect("create");
    block_on(harness.runtime.settle());

    let icon_id = desktop_icon_id_for_path("/Desktop/readme.txt");
    let position = icon_position(&harness.runtime, &icon_id);
    for time_ms in [5_000, 5_100] {
        let input = PointerInput::mouse(1, position.x + 20, position.y + 20, time_ms);
        block_on(harness.runtime.dispatch(DesktopAction::IconPointerDown {
            icon_id: icon_id.clone(),
            input,
        }))
        .expect("down");
        block_on(harness.runtime.dispatch(DesktopAction::PointerUp { input })).expect("up");
    }

    let window = harness.runtime.state().windows.last().expect("window").clone();
    assert_eq!(window.app_id, apps::notepad_id());
    assert_eq!(window.title, "readme.txt - Notepad");
    let notepad = harness.runtime.app::<NotepadApp>(window.id).expect("notepad");
    assert_eq!(notepad.document().content, "read me");
}

#[test]
fn dynamic_apps_get_a_shortcut_and_launch_sandboxed() {
    let mut harness = booted();
    let config = apps::DynamicAppConfig::from_import("Pixel Pad", "🎨").expect("config");

    assert_eq!(
        block_on(
            harness
                .runtime
                .register_dynamic_app(&config, Some("<p>hi</p>"), None)
        ),
        Ok(true)
    );
    assert!(harness
        .runtime
        .state()
        .icon(&app_icon_id(&config.app_id))
        .is_some());

    let window_id =
        block_on(harness.runtime.open_app(config.app_id.clone(), Value::Null)).expect("launch");
    let app = harness
        .runtime
        .app::<SandboxedHtmlApp>(window_id)
        .expect("sandboxed app");
    assert_eq!(app.html(), "<p>hi</p>");
}

#[test]
fn emptying_the_recycle_bin_needs_confirmation() {
    let mut harness = booted();
    let path = block_on(harness.runtime.create_desktop_text_file("old", false)).expect("create");
    block_on(harness.runtime.delete_icon(&desktop_icon_id_for_path(&path), true)).expect("delete");

    assert_eq!(block_on(harness.runtime.empty_recycle_bin(false)), Ok(0));
    assert_eq!(block_on(harness.runtime.empty_recycle_bin(true)), Ok(1));
    let vfs = harness.runtime.host().vfs.clone();
    assert!(block_on(vfs.list_directory(RECYCLE_BIN_DIR))
        .expect("list")
        .is_empty());
}

#[test]
fn existing_desktop_file_is_only_replaced_when_confirmed() {
    let mut harness = booted();
    block_on(harness.runtime.create_desktop_text_file("memo.txt", false)).expect("create");

    assert!(matches!(
        block_on(harness.runtime.create_desktop_text_file("memo.txt", false)),
        Err(RuntimeError::Vfs(_))
    ));
    assert_eq!(
        harness.notifications.sent().last().map(|n| n.body.clone()),
        Some("File \"memo.txt\" already exists on the Desktop.".to_string())
    );
    assert_eq!(
        block_on(harness.runtime.create_desktop_text_file("memo.txt", true)),
        Ok("/Desktop/memo.txt".to_string())
    );
}
