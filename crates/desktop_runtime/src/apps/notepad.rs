//! Plain-text editor over the virtual filesystem.

use std::{any::Any, cell::RefCell, rc::Rc};

use desktop_app_contract::{AppInstance, AppLaunchContext, AppServices, LaunchError};
use futures::future::LocalBoxFuture;
use leptos::logging;
use platform_host::{parse_path, DOCUMENTS_DIR};
use serde::Serialize;
use serde_json::{json, Value};

const UNTITLED_FILE_NAME: &str = "Untitled.txt";
const TEXT_EXTENSION: &str = ".txt";

/// Removes characters the shell does not allow in names, a single trailing dot, and surrounding
/// whitespace. An empty result becomes `Untitled`.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned).trim();
    if cleaned.is_empty() {
        "Untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_text_extension(name: String) -> String {
    if name.to_lowercase().ends_with(TEXT_EXTENSION) {
        name
    } else {
        format!("{name}{TEXT_EXTENSION}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
/// Status line shown under the editor.
pub enum NotepadStatus {
    New,
    Loaded,
    LoadFailed,
    Unsaved,
    Saved,
    SaveFailed,
    Cleared,
}

impl NotepadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New file",
            Self::Loaded => "Loaded",
            Self::LoadFailed => "Error: File not found",
            Self::Unsaved => "Unsaved changes",
            Self::Saved => "File Saved",
            Self::SaveFailed => "Error saving file",
            Self::Cleared => "Content cleared.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Editor buffer plus the file it is bound to.
pub struct NotepadDocument {
    pub file_path: Option<String>,
    pub file_name: String,
    pub saved_content: String,
    pub content: String,
    pub status: NotepadStatus,
}

impl NotepadDocument {
    fn new(file_path: Option<String>) -> Self {
        let file_name = file_path
            .as_deref()
            .map(|path| parse_path(path).name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNTITLED_FILE_NAME.to_string());
        Self {
            file_path,
            file_name,
            saved_content: String::new(),
            content: String::new(),
            status: NotepadStatus::New,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.content != self.saved_content
    }

    /// Window title; a leading `*` marks unsaved changes.
    pub fn title(&self) -> String {
        let marker = if self.is_dirty() { "*" } else { "" };
        format!("{marker}{} - Notepad", self.file_name)
    }
}

#[derive(Clone)]
/// Notepad instance. Clones share the document so async hooks can outlive the borrow.
pub struct NotepadApp {
    services: AppServices,
    document: Rc<RefCell<NotepadDocument>>,
}

pub(super) fn launch(context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
    let file_path = context
        .launch_params
        .get("filePath")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Box::new(NotepadApp::new(context.services, file_path)))
}

impl NotepadApp {
    pub fn new(services: AppServices, file_path: Option<String>) -> Self {
        let app = Self {
            services,
            document: Rc::new(RefCell::new(NotepadDocument::new(file_path))),
        };
        app.publish_title();
        app
    }

    /// Copy of the current document state.
    pub fn document(&self) -> NotepadDocument {
        self.document.borrow().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.document.borrow().is_dirty()
    }

    pub fn title(&self) -> String {
        self.document.borrow().title()
    }

    fn publish_title(&self) {
        let title = self.title();
        self.services.set_title(title);
    }

    fn set_status(&self, status: NotepadStatus) {
        self.document.borrow_mut().status = status;
    }

    /// Loads the bound file, if any. A missing file unbinds the document.
    pub async fn load(&self) {
        let file_path = self.document.borrow().file_path.clone();
        let Some(path) = file_path else {
            self.set_status(NotepadStatus::New);
            return;
        };
        let loaded = match self.services.vfs.get_item(&path).await {
            Ok(Some(item)) if item.is_file() => Some(item.content().unwrap_or_default().to_string()),
            Ok(_) => None,
            Err(err) => {
                logging::warn!("notepad could not load `{path}`: {err}");
                None
            }
        };
        {
            let mut document = self.document.borrow_mut();
            match loaded {
                Some(content) => {
                    document.saved_content = content.clone();
                    document.content = content;
                    document.status = NotepadStatus::Loaded;
                }
                None => {
                    document.file_path = None;
                    document.status = NotepadStatus::LoadFailed;
                }
            }
        }
        self.publish_title();
    }

    /// Replaces the buffer (one edit in the text area).
    pub fn set_content(&self, content: impl Into<String>) {
        let was_dirty = self.is_dirty();
        {
            let mut document = self.document.borrow_mut();
            document.content = content.into();
            if document.is_dirty() {
                document.status = NotepadStatus::Unsaved;
            } else if document.file_path.is_some() {
                document.status = NotepadStatus::Saved;
            } else {
                document.status = NotepadStatus::New;
            }
        }
        if was_dirty != self.is_dirty() {
            self.publish_title();
        }
    }

    /// Saves to the bound file, asking for a name first when there is none.
    pub async fn save(&self) -> bool {
        self.save_with(false).await
    }

    /// Always asks for a name before saving.
    pub async fn save_as(&self) -> bool {
        self.save_with(true).await
    }

    async fn save_with(&self, ask_for_name: bool) -> bool {
        let (current_path, current_name, content) = {
            let document = self.document.borrow();
            (
                document.file_path.clone(),
                document.file_name.clone(),
                document.content.clone(),
            )
        };

        let (save_path, file_name) = match (&current_path, ask_for_name) {
            (Some(path), false) => (path.clone(), current_name),
            _ => {
                let answer = self
                    .services
                    .dialogs
                    .prompt("Save As:", &current_name)
                    .await;
                let Some(raw) = answer.filter(|raw| !raw.is_empty()) else {
                    return false;
                };
                let file_name = with_text_extension(sanitize_filename(&raw));
                let parent = current_path
                    .as_deref()
                    .and_then(|path| parse_path(path).parent_path)
                    .unwrap_or_else(|| DOCUMENTS_DIR.to_string());
                let save_path = format!("{parent}{file_name}");

                if current_path.as_deref() != Some(save_path.as_str()) {
                    let exists = matches!(self.services.vfs.get_item(&save_path).await, Ok(Some(_)));
                    if exists
                        && !self
                            .services
                            .dialogs
                            .confirm(
                                "Notepad",
                                &format!("File \"{file_name}\" already exists. Overwrite?"),
                            )
                            .await
                    {
                        return false;
                    }
                }
                (save_path, file_name)
            }
        };

        match self.services.vfs.create_file(&save_path, &content, true).await {
            Ok(_) => {
                {
                    let mut document = self.document.borrow_mut();
                    document.saved_content = content;
                    document.file_path = Some(save_path);
                    document.file_name = file_name;
                    document.status = NotepadStatus::Saved;
                }
                self.publish_title();
                true
            }
            Err(err) => {
                logging::error!("notepad failed to save `{save_path}`: {err}");
                self.set_status(NotepadStatus::SaveFailed);
                self.services.notify("Notepad", "Failed to save file.");
                false
            }
        }
    }

    /// Empties the buffer, confirming first when there are unsaved changes.
    pub async fn clear(&self) -> bool {
        if self.is_dirty()
            && !self
                .services
                .dialogs
                .confirm(
                    "Notepad",
                    "You have unsaved changes. Are you sure you want to clear the content?",
                )
                .await
        {
            return false;
        }
        self.set_content(String::new());
        self.set_status(NotepadStatus::Cleared);
        true
    }
}

impl AppInstance for NotepadApp {
    fn on_mount(&mut self) -> Option<LocalBoxFuture<'static, ()>> {
        let app = self.clone();
        Some(Box::pin(async move { app.load().await }))
    }

    fn on_close(&mut self) -> Option<LocalBoxFuture<'static, bool>> {
        let document = self.document.borrow();
        if !document.is_dirty() {
            return None;
        }
        let message = format!(
            "{} - Notepad: You have unsaved changes. Are you sure you want to close?",
            document.file_name
        );
        Some(self.services.dialogs.confirm("Notepad", &message))
    }

    fn snapshot(&self) -> Value {
        let document = self.document.borrow();
        json!({
            "filePath": document.file_path,
            "fileName": document.file_name,
            "dirty": document.is_dirty(),
            "status": document.status.label(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
