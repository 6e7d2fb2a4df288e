//! Small built-in apps: calculator, image viewer, recycle bin, about, and the launch-error window.

use std::{any::Any, cell::RefCell, rc::Rc};

use desktop_app_contract::{AppInstance, AppLaunchContext, AppServices, LaunchError};
use futures::future::LocalBoxFuture;
use leptos::logging;
use platform_host::{parse_path, VfsChange, VfsItem, RECYCLE_BIN_DIR};
use serde::Serialize;
use serde_json::{json, Value};

macro_rules! any_accessors {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

fn string_param(context: &AppLaunchContext, key: &str) -> Option<String> {
    context
        .launch_params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

const CALCULATOR_ERROR: &str = "Error";
const CALCULATOR_DISPLAY_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Four-function calculator driven by key presses.
pub struct CalculatorApp {
    current: String,
    previous: String,
    operator: Option<char>,
    waiting_for_operand: bool,
}

impl Default for CalculatorApp {
    fn default() -> Self {
        Self {
            current: "0".to_string(),
            previous: String::new(),
            operator: None,
            waiting_for_operand: false,
        }
    }
}

pub(super) fn launch_calculator(_: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
    Ok(Box::<CalculatorApp>::default())
}

fn format_number(value: f64) -> String {
    // Twelve significant digits hides binary rounding noise such as 0.1 + 0.2.
    let rounded = format!("{value:.11e}").parse::<f64>().unwrap_or(value);
    format!("{rounded}")
}

fn calculate(current: &str, previous: &str, operator: char) -> String {
    let (Ok(lhs), Ok(rhs)) = (previous.parse::<f64>(), current.parse::<f64>()) else {
        return CALCULATOR_ERROR.to_string();
    };
    let result = match operator {
        '+' => lhs + rhs,
        '-' => lhs - rhs,
        '*' => lhs * rhs,
        '/' if rhs == 0.0 => return CALCULATOR_ERROR.to_string(),
        '/' => lhs / rhs,
        _ => rhs,
    };
    format_number(result)
}

impl CalculatorApp {
    /// Applies one key: a digit, `.`, `C`, `←`, an operator, or `=`.
    pub fn press(&mut self, key: &str) {
        match key {
            digit if digit.len() == 1 && digit.chars().all(|c| c.is_ascii_digit()) => {
                if self.current == CALCULATOR_ERROR || self.waiting_for_operand || self.current == "0"
                {
                    self.current = digit.to_string();
                    self.waiting_for_operand = false;
                } else {
                    self.current.push_str(digit);
                }
            }
            "." => {
                if self.waiting_for_operand {
                    self.current = "0.".to_string();
                    self.waiting_for_operand = false;
                } else if !self.current.contains('.') {
                    self.current.push('.');
                }
            }
            "C" => *self = Self::default(),
            "←" => {
                if self.current == CALCULATOR_ERROR {
                    self.current.clear();
                } else {
                    self.current.pop();
                }
                if self.current.is_empty() {
                    self.current = "0".to_string();
                }
                if self.waiting_for_operand && self.current == "0" {
                    self.waiting_for_operand = false;
                }
            }
            "+" | "-" | "*" | "/" => {
                if let Some(operator) = self.operator {
                    if !self.waiting_for_operand && !self.previous.is_empty() {
                        self.current = calculate(&self.current, &self.previous, operator);
                    }
                }
                self.previous = self.current.clone();
                self.operator = key.chars().next();
                self.waiting_for_operand = true;
            }
            "=" => {
                if let Some(operator) = self.operator.filter(|_| !self.previous.is_empty()) {
                    self.current = calculate(&self.current, &self.previous, operator);
                    self.previous.clear();
                    self.operator = None;
                    self.waiting_for_operand = true;
                }
            }
            other => logging::warn!("calculator ignored key `{other}`"),
        }
    }

    /// Display text; long numbers switch to exponent notation.
    pub fn display(&self) -> String {
        if self.current.len() <= CALCULATOR_DISPLAY_LIMIT || self.current == CALCULATOR_ERROR {
            return self.current.clone();
        }
        match self.current.parse::<f64>() {
            Ok(value) => {
                let text = format!("{value:.6e}");
                match text.split_once('e') {
                    Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                        format!("{mantissa}e+{exponent}")
                    }
                    _ => text,
                }
            }
            Err(_) => self.current.clone(),
        }
    }
}

impl AppInstance for CalculatorApp {
    fn snapshot(&self) -> Value {
        json!({ "display": self.display() })
    }

    any_accessors!();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ImageViewerState {
    file_path: Option<String>,
    source: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
/// Shows one image from a VFS file (stored as a data URL) or from a URL.
pub struct ImageViewerApp {
    services: AppServices,
    state: Rc<RefCell<ImageViewerState>>,
}

pub(super) fn launch_image_viewer(
    context: AppLaunchContext,
) -> Result<Box<dyn AppInstance>, LaunchError> {
    let app = ImageViewerApp::new(context.services.clone(), string_param(&context, "filePath"));
    if let Some(url) = string_param(&context, "initialUrl") {
        app.load_url(&url);
    }
    Ok(Box::new(app))
}

impl ImageViewerApp {
    pub fn new(services: AppServices, file_path: Option<String>) -> Self {
        Self {
            services,
            state: Rc::new(RefCell::new(ImageViewerState {
                file_path,
                source: None,
                message: Some("Enter image URL or open an image file.".to_string()),
            })),
        }
    }

    /// Image source currently shown.
    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    /// Message shown instead of (or over) the image.
    pub fn message(&self) -> Option<String> {
        self.state.borrow().message.clone()
    }

    fn show(&self, source: String) {
        let mut state = self.state.borrow_mut();
        state.source = Some(source);
        state.message = None;
    }

    fn show_message(&self, message: &str) {
        let mut state = self.state.borrow_mut();
        state.source = None;
        state.message = Some(message.to_string());
    }

    pub fn load_url(&self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            self.show_message("Please enter an image URL.");
        } else {
            self.show(url.to_string());
        }
    }

    /// Loads the bound file, if any.
    pub async fn load_file(&self) {
        let Some(path) = self.state.borrow().file_path.clone() else {
            return;
        };
        match self.services.vfs.get_item(&path).await {
            Ok(Some(item)) if item.is_file() => {
                let content = item.content().unwrap_or_default().trim().to_string();
                if content.is_empty() {
                    self.show_message("This image file is empty.");
                } else {
                    self.show(content);
                }
                self.services
                    .set_title(format!("{} - Image Viewer", parse_path(&path).name));
            }
            Ok(_) => self.show_message("Image file not found."),
            Err(err) => {
                logging::warn!("image viewer could not load `{path}`: {err}");
                self.show_message("Error loading image.");
            }
        }
    }
}

impl AppInstance for ImageViewerApp {
    fn on_mount(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        let app = self.clone();
        Some(Box::pin(async move { app.load_file().await }))
    }

    fn snapshot(&self) -> Value {
        let state = self.state.borrow();
        json!({
            "filePath": state.file_path,
            "hasImage": state.source.is_some(),
            "message": state.message,
        })
    }

    any_accessors!();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One top-level item in the recycle bin.
pub struct RecycleBinEntry {
    pub path: String,
    pub name: String,
    pub original_path: Option<String>,
    pub is_folder: bool,
}

impl From<&VfsItem> for RecycleBinEntry {
    fn from(item: &VfsItem) -> Self {
        Self {
            path: item.path.clone(),
            name: item.name.clone(),
            original_path: item.recycled.as_ref().map(|tag| tag.original_path.clone()),
            is_folder: item.is_folder(),
        }
    }
}

#[derive(Clone)]
/// Lists recycled items and restores or purges them.
pub struct RecycleBinApp {
    services: AppServices,
    entries: Rc<RefCell<Vec<RecycleBinEntry>>>,
}

pub(super) fn launch_recycle_bin(
    context: AppLaunchContext,
) -> Result<Box<dyn AppInstance>, LaunchError> {
    Ok(Box::new(RecycleBinApp::new(context.services)))
}

impl RecycleBinApp {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            entries: Rc::default(),
        }
    }

    pub fn entries(&self) -> Vec<RecycleBinEntry> {
        self.entries.borrow().clone()
    }

    pub async fn refresh(&self) {
        match self.services.vfs.list_directory(RECYCLE_BIN_DIR).await {
            Ok(mut items) => {
                platform_host::sort_for_display(&mut items);
                *self.entries.borrow_mut() = items.iter().map(RecycleBinEntry::from).collect();
            }
            Err(err) => logging::warn!("recycle bin could not be listed: {err}"),
        }
    }

    /// Moves an entry back to where it was deleted from (or onto the desktop).
    pub async fn restore(&self, path: &str) -> bool {
        match self.services.vfs.restore_item(path).await {
            Ok(outcome) => {
                if outcome.fell_back {
                    self.services.notify(
                        "Recycle Bin",
                        format!(
                            "\"{}\" was restored to the Desktop because its original location is unavailable.",
                            outcome.item.name
                        ),
                    );
                }
                true
            }
            Err(err) => {
                logging::warn!("restore of `{path}` failed: {err}");
                self.services.notify("Recycle Bin", "Failed to restore item.");
                false
            }
        }
    }

    /// Confirms, then deletes one entry for good.
    pub async fn purge(&self, path: &str) -> bool {
        let name = parse_path(path).name;
        let question = format!("Permanently delete \"{name}\"? This action cannot be undone.");
        if !self.services.dialogs.confirm("Recycle Bin", &question).await {
            return false;
        }
        match self.services.vfs.permanent_delete_item(path).await {
            Ok(_) => true,
            Err(err) => {
                logging::warn!("purge of `{path}` failed: {err}");
                self.services.notify("Recycle Bin", "Failed to delete item.");
                false
            }
        }
    }

    /// Confirms, then deletes everything in the bin.
    pub async fn empty(&self) -> bool {
        if self.entries.borrow().is_empty() {
            return false;
        }
        if !self
            .services
            .dialogs
            .confirm(
                "Recycle Bin",
                "Permanently delete all items in the Recycle Bin?",
            )
            .await
        {
            return false;
        }
        match self.services.vfs.empty_recycle_bin().await {
            Ok(_) => true,
            Err(err) => {
                logging::warn!("emptying the recycle bin failed: {err}");
                self.services.notify("Recycle Bin", "Failed to empty the Recycle Bin.");
                false
            }
        }
    }
}

impl AppInstance for RecycleBinApp {
    fn on_mount(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        let app = self.clone();
        Some(Box::pin(async move { app.refresh().await }))
    }

    fn on_vfs_change(&mut self, change: &VfsChange) -> Option<LocalBoxFuture<'static, ()>> {
        if change.dir_path() != RECYCLE_BIN_DIR {
            return None;
        }
        let app = self.clone();
        Some(Box::pin(async move { app.refresh().await }))
    }

    fn snapshot(&self) -> Value {
        json!({ "entries": *self.entries.borrow() })
    }

    any_accessors!();
}

pub const ABOUT_HEADLINE: &str = "Web Desktop Environment";

const ABOUT_FEATURES: [&str; 6] = [
    "Persistent virtual file system",
    "File Explorer and Notepad for text files",
    "Desktop icons for files and folders",
    "Draggable and resizable windows with edge snapping",
    "Taskbar with running apps",
    "Recycle Bin with restore",
];

#[derive(Debug, Clone, Default)]
/// Static product information.
pub struct AboutApp;

pub(super) fn launch_about(_: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
    Ok(Box::new(AboutApp))
}

impl AboutApp {
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn features() -> &'static [&'static str] {
        &ABOUT_FEATURES
    }
}

impl AppInstance for AboutApp {
    fn snapshot(&self) -> Value {
        json!({
            "headline": ABOUT_HEADLINE,
            "version": Self::version(),
            "features": ABOUT_FEATURES,
        })
    }

    any_accessors!();
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Window shown in place of an app that could not be launched.
pub struct ErrorApp {
    errored_app_id: String,
}

pub(super) fn launch_error(context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
    let errored_app_id =
        string_param(&context, "erroredAppId").unwrap_or_else(|| "unknown".to_string());
    Ok(Box::new(ErrorApp::new(errored_app_id)))
}

impl ErrorApp {
    pub fn new(errored_app_id: impl Into<String>) -> Self {
        Self {
            errored_app_id: errored_app_id.into(),
        }
    }

    pub fn errored_app_id(&self) -> &str {
        &self.errored_app_id
    }

    pub fn message(&self) -> String {
        format!(
            "The application \"{}\" could not be launched.",
            self.errored_app_id
        )
    }
}

impl AppInstance for ErrorApp {
    fn snapshot(&self) -> Value {
        json!({ "erroredAppId": self.errored_app_id, "message": self.message() })
    }

    any_accessors!();
}
