//! App registry: the manifest catalog generated at build time plus dynamically registered apps.

mod dynamic;
mod explorer;
mod notepad;
mod accessories;

use std::{collections::BTreeMap, rc::Rc};

use desktop_app_contract::{
    AppLaunchFn, AppModule, AppRegistration, ApplicationId, Launchable,
};
use leptos::logging;
use serde_json::Value;

use crate::model::{OpenWindowRequest, WindowFlags};

pub use dynamic::{
    dynamic_app_dir, load_dynamic_apps, register_dynamic_app, DynamicAppConfig, SandboxedHtmlApp,
    DYNAMIC_APP_WINDOW_DEFAULTS,
};
pub use explorer::ExplorerApp;
pub use notepad::{sanitize_filename, NotepadApp, NotepadDocument, NotepadStatus};
pub use accessories::{
    AboutApp, CalculatorApp, ErrorApp, ImageViewerApp, RecycleBinApp, RecycleBinEntry,
};

include!(concat!(env!("OUT_DIR"), "/app_catalog_generated.rs"));

pub const NOTEPAD_APP_ID: &str = "system.notepad";
pub const EXPLORER_APP_ID: &str = "system.explorer";
pub const CALCULATOR_APP_ID: &str = "system.calculator";
pub const IMAGE_VIEWER_APP_ID: &str = "system.image-viewer";
pub const RECYCLE_BIN_APP_ID: &str = "system.recycle-bin";
pub const ABOUT_APP_ID: &str = "system.about";
pub const ERROR_APP_ID: &str = "system.error";

pub fn notepad_id() -> ApplicationId {
    ApplicationId::trusted(NOTEPAD_APP_ID)
}

pub fn explorer_id() -> ApplicationId {
    ApplicationId::trusted(EXPLORER_APP_ID)
}

pub fn calculator_id() -> ApplicationId {
    ApplicationId::trusted(CALCULATOR_APP_ID)
}

pub fn image_viewer_id() -> ApplicationId {
    ApplicationId::trusted(IMAGE_VIEWER_APP_ID)
}

pub fn recycle_bin_id() -> ApplicationId {
    ApplicationId::trusted(RECYCLE_BIN_APP_ID)
}

pub fn about_id() -> ApplicationId {
    ApplicationId::trusted(ABOUT_APP_ID)
}

pub fn error_id() -> ApplicationId {
    ApplicationId::trusted(ERROR_APP_ID)
}

/// Built-in registrations decoded from the generated manifest catalog.
pub fn catalog() -> Vec<AppRegistration> {
    match serde_json::from_str::<Vec<AppRegistration>>(APP_MANIFEST_CATALOG_JSON) {
        Ok(registrations) => registrations,
        Err(err) => {
            logging::error!("app manifest catalog failed to decode: {err}");
            Vec::new()
        }
    }
}

fn builtin_module(app_id: &ApplicationId) -> Option<AppModule> {
    let launch_fn: AppLaunchFn = match app_id.as_str() {
        NOTEPAD_APP_ID => notepad::launch,
        EXPLORER_APP_ID => explorer::launch,
        CALCULATOR_APP_ID => accessories::launch_calculator,
        IMAGE_VIEWER_APP_ID => accessories::launch_image_viewer,
        RECYCLE_BIN_APP_ID => accessories::launch_recycle_bin,
        ABOUT_APP_ID => accessories::launch_about,
        ERROR_APP_ID => accessories::launch_error,
        _ => return None,
    };
    Some(AppModule::new(launch_fn))
}

#[derive(Clone)]
/// One launchable app.
pub struct AppEntry {
    pub registration: AppRegistration,
    pub launcher: Rc<dyn Launchable>,
}

#[derive(Clone, Default)]
/// Maps app ids to their registration and launcher.
pub struct AppRegistry {
    entries: BTreeMap<ApplicationId, AppEntry>,
}

impl AppRegistry {
    /// Registry holding every catalog app that has a built-in module.
    pub fn with_builtin_apps() -> Self {
        let mut registry = Self::default();
        for registration in catalog() {
            match builtin_module(&registration.app_id) {
                Some(module) => {
                    registry.register(registration, Rc::new(module));
                }
                None => logging::warn!(
                    "app manifest `{}` has no built-in module; skipped",
                    registration.app_id
                ),
            }
        }
        registry
    }

    /// Adds or replaces an app. Returns the replaced entry.
    pub fn register(
        &mut self,
        registration: AppRegistration,
        launcher: Rc<dyn Launchable>,
    ) -> Option<AppEntry> {
        let app_id = registration.app_id.clone();
        let previous = self.entries.insert(
            app_id.clone(),
            AppEntry {
                registration,
                launcher,
            },
        );
        if previous.is_some() {
            logging::warn!("app `{app_id}` was already registered; replaced");
        }
        previous
    }

    pub fn get(&self, app_id: &ApplicationId) -> Option<&AppEntry> {
        self.entries.get(app_id)
    }

    pub fn registration(&self, app_id: &ApplicationId) -> Option<&AppRegistration> {
        self.get(app_id).map(|entry| &entry.registration)
    }

    pub fn contains(&self, app_id: &ApplicationId) -> bool {
        self.entries.contains_key(app_id)
    }

    pub fn registrations(&self) -> impl Iterator<Item = &AppRegistration> {
        self.entries.values().map(|entry| &entry.registration)
    }

    pub fn desktop_apps(&self) -> Vec<&AppRegistration> {
        self.registrations()
            .filter(|registration| registration.show_on_desktop)
            .collect()
    }

    /// Apps listed in the start menu, by display name.
    pub fn launcher_apps(&self) -> Vec<&AppRegistration> {
        let mut apps: Vec<&AppRegistration> = self
            .registrations()
            .filter(|registration| registration.show_in_launcher)
            .collect();
        apps.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        apps
    }
}

/// Window request for launching `registration` with `params`.
pub fn open_request_for(registration: &AppRegistration, params: Value) -> OpenWindowRequest {
    let mut req = OpenWindowRequest::new(
        registration.app_id.clone(),
        registration.display_name.clone(),
    );
    req.glyph = registration.glyph.clone();
    req.size = registration.window_defaults;
    req.modal = registration.modal;
    req.flags = WindowFlags {
        resizable: registration.resizable,
        minimizable: !registration.modal,
        maximizable: registration.maximizable,
        auto_focus_content: registration.auto_focus_content,
    };
    req.launch_params = params;
    req
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn catalog_decodes_every_builtin_manifest() {
        let ids: Vec<String> = catalog()
            .into_iter()
            .map(|registration| registration.app_id.to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                ABOUT_APP_ID,
                CALCULATOR_APP_ID,
                ERROR_APP_ID,
                EXPLORER_APP_ID,
                IMAGE_VIEWER_APP_ID,
                NOTEPAD_APP_ID,
                RECYCLE_BIN_APP_ID,
            ]
        );
    }

    #[test]
    fn every_catalog_app_has_a_module() {
        let registry = AppRegistry::with_builtin_apps();
        for registration in catalog() {
            assert!(registry.contains(&registration.app_id), "{}", registration.app_id);
        }
    }

    #[test]
    fn desktop_and_launcher_views_follow_manifest_flags() {
        let registry = AppRegistry::with_builtin_apps();
        let desktop: Vec<&str> = registry
            .desktop_apps()
            .into_iter()
            .map(|registration| registration.app_id.as_str())
            .collect();
        assert!(desktop.contains(&NOTEPAD_APP_ID));
        assert!(desktop.contains(&RECYCLE_BIN_APP_ID));
        assert!(!desktop.contains(&ERROR_APP_ID));

        let launcher: Vec<&str> = registry
            .launcher_apps()
            .into_iter()
            .map(|registration| registration.app_id.as_str())
            .collect();
        assert!(!launcher.contains(&RECYCLE_BIN_APP_ID));
        assert!(!launcher.contains(&ERROR_APP_ID));
    }

    #[test]
    fn open_request_carries_manifest_window_settings() {
        let registry = AppRegistry::with_builtin_apps();
        let calculator = registry.registration(&calculator_id()).expect("calculator");
        let req = open_request_for(calculator, json!({ "seed": 1 }));

        assert_eq!((req.size.width, req.size.height), (320, 460));
        assert!(!req.flags.resizable);
        assert!(!req.flags.maximizable);
        assert_eq!(req.title, "Calculator");
        assert_eq!(req.launch_params, json!({ "seed": 1 }));
    }
}
