//! File explorer over one VFS directory at a time.

use std::{any::Any, cell::RefCell, rc::Rc};

use desktop_app_contract::{AppInstance, AppLaunchContext, AppServices, LaunchError};
use futures::future::LocalBoxFuture;
use leptos::logging;
use platform_host::{
    join_child, normalize_dir, normalize_virtual_path, parse_path, sort_for_display, VfsChange,
    VfsItem, ROOT_PATH,
};
use serde_json::{json, Value};

use super::notepad::sanitize_filename;
use crate::icons::{open_target_for_path, OpenTarget};

const APP_TITLE: &str = "File Explorer";

#[derive(Debug, Clone, Default)]
struct ExplorerView {
    current_path: String,
    items: Vec<VfsItem>,
    error: Option<String>,
}

#[derive(Clone)]
/// Explorer instance. Clones share the view.
pub struct ExplorerApp {
    services: AppServices,
    view: Rc<RefCell<ExplorerView>>,
}

pub(super) fn launch(context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
    let initial_path = context
        .launch_params
        .get("initialPath")
        .and_then(Value::as_str)
        .unwrap_or(ROOT_PATH)
        .to_string();
    Ok(Box::new(ExplorerApp::new(context.services, &initial_path)))
}

fn directory_path(raw: &str) -> String {
    normalize_dir(&normalize_virtual_path(raw))
}

impl ExplorerApp {
    pub fn new(services: AppServices, initial_path: &str) -> Self {
        Self {
            services,
            view: Rc::new(RefCell::new(ExplorerView {
                current_path: directory_path(initial_path),
                ..ExplorerView::default()
            })),
        }
    }

    pub fn current_path(&self) -> String {
        self.view.borrow().current_path.clone()
    }

    /// Listed children: folders first, then by name.
    pub fn items(&self) -> Vec<VfsItem> {
        self.view.borrow().items.clone()
    }

    /// Message shown instead of the listing when the directory could not be read.
    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    pub fn can_go_up(&self) -> bool {
        self.current_path() != ROOT_PATH
    }

    /// Re-reads the current directory.
    pub async fn refresh(&self) {
        let path = self.current_path();
        let listing = self.services.vfs.list_directory(&path).await;
        let mut view = self.view.borrow_mut();
        if view.current_path != path {
            return;
        }
        match listing {
            Ok(mut items) => {
                sort_for_display(&mut items);
                view.items = items;
                view.error = None;
            }
            Err(err) => {
                logging::warn!("explorer could not list `{path}`: {err}");
                view.items.clear();
                view.error = Some("Error loading folder content.".to_string());
            }
        }
    }

    /// Shows `path` (normalized to a folder path).
    pub async fn navigate(&self, path: &str) {
        self.view.borrow_mut().current_path = directory_path(path);
        self.refresh().await;
    }

    /// Moves to the parent folder; a no-op at the root.
    pub async fn go_up(&self) {
        let Some(parent) = parse_path(&self.current_path()).parent_path else {
            return;
        };
        self.navigate(&parent).await;
    }

    fn item(&self, path: &str) -> Option<VfsItem> {
        self.view
            .borrow()
            .items
            .iter()
            .find(|item| item.path == path)
            .cloned()
    }

    /// Opens a listed entry: folders in place, files in their handler app.
    pub async fn open_item(&self, path: &str) {
        let Some(item) = self.item(path) else {
            return;
        };
        if item.is_folder() {
            self.navigate(&item.path).await;
            return;
        }
        match open_target_for_path(&item.path, false) {
            OpenTarget::LaunchApp { app_id, params } => self.services.open_app(app_id, params),
            OpenTarget::Unsupported { .. } => self.services.notify(
                APP_TITLE,
                format!("Opening file \"{}\" is not supported yet.", item.name),
            ),
        }
    }

    /// Prompts for a name and creates an empty text file here.
    pub async fn new_text_file(&self) -> bool {
        let Some(name) = self
            .ask_name("Enter name for new text file:", "New Text File.txt")
            .await
        else {
            return false;
        };
        let name = if name.to_lowercase().ends_with(".txt") {
            name
        } else {
            format!("{name}.txt")
        };
        let path = join_child(&self.current_path(), &name, false);
        match self.services.vfs.create_file(&path, "", false).await {
            Ok(_) => true,
            Err(err) => {
                self.report_failure("Failed to create text file.", &err.to_string());
                false
            }
        }
    }

    /// Prompts for a name and creates a folder here.
    pub async fn new_folder(&self) -> bool {
        let Some(name) = self.ask_name("Enter name for new folder:", "New Folder").await else {
            return false;
        };
        let path = join_child(&self.current_path(), &name, true);
        match self.services.vfs.create_folder(&path).await {
            Ok(_) => true,
            Err(err) => {
                self.report_failure("Failed to create folder.", &err.to_string());
                false
            }
        }
    }

    /// Prompts for a new name for a listed entry.
    pub async fn rename_item(&self, path: &str) -> bool {
        let Some(item) = self.item(path) else {
            return false;
        };
        let Some(name) = self.ask_name("Rename to:", &item.name).await else {
            return false;
        };
        if name == item.name {
            return false;
        }
        let parent = item.parent_path.clone().unwrap_or_else(|| ROOT_PATH.to_string());
        let target = join_child(&parent, &name, item.is_folder());
        match self.services.vfs.rename_item(&item.path, &target).await {
            Ok(_) => true,
            Err(err) => {
                self.report_failure("Failed to rename item.", &err.to_string());
                false
            }
        }
    }

    /// Confirms, then deletes a listed entry (recycling it unless it is already recycled).
    pub async fn delete_item(&self, path: &str) -> bool {
        let Some(item) = self.item(path) else {
            return false;
        };
        let question = format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            item.name
        );
        if !self.services.dialogs.confirm(APP_TITLE, &question).await {
            return false;
        }
        match self.services.vfs.delete_item(&item.path).await {
            Ok(_) => true,
            Err(err) => {
                self.report_failure("Failed to delete item.", &err.to_string());
                false
            }
        }
    }

    async fn ask_name(&self, question: &str, default_name: &str) -> Option<String> {
        self.services
            .dialogs
            .prompt(question, default_name)
            .await
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| sanitize_filename(&raw))
    }

    fn report_failure(&self, message: &str, detail: &str) {
        logging::warn!("explorer: {message} {detail}");
        self.services.notify(APP_TITLE, message);
    }
}

impl AppInstance for ExplorerApp {
    fn on_mount(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        let app = self.clone();
        Some(Box::pin(async move { app.refresh().await }))
    }

    fn on_vfs_change(&mut self, change: &VfsChange) -> Option<LocalBoxFuture<'static, ()>> {
        if change.dir_path() != self.current_path() {
            return None;
        }
        let app = self.clone();
        Some(Box::pin(async move { app.refresh().await }))
    }

    fn snapshot(&self) -> Value {
        let view = self.view.borrow();
        json!({
            "currentPath": view.current_path,
            "items": view.items.iter().map(|item| item.name.as_str()).collect::<Vec<_>>(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
