//! User-supplied HTML apps: registration, persistence under `/user_apps/`, and the sandboxed
//! launcher that hosts them.

use std::{any::Any, rc::Rc};

use desktop_app_contract::{
    AppInstance, AppLaunchContext, AppRegistration, ApplicationId, LaunchError, Launchable,
    WindowDefaults,
};
use leptos::logging;
use platform_host::{join_child, VfsError, VfsService, USER_APPS_DIR};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppRegistry;

pub const DYNAMIC_APP_WINDOW_DEFAULTS: WindowDefaults = WindowDefaults {
    width: 800,
    height: 600,
};

const CONFIG_FILE_NAME: &str = "config.json";
const CONTENT_FILE_NAME: &str = "index.html";
const DEFAULT_DYNAMIC_GLYPH: &str = "📄";
const SANDBOX_FLAGS: &str = "allow-scripts allow-forms allow-popups";

fn default_glyph() -> String {
    DEFAULT_DYNAMIC_GLYPH.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Descriptor persisted as `/user_apps/<id>/config.json`.
pub struct DynamicAppConfig {
    pub app_id: ApplicationId,
    pub name: String,
    #[serde(default = "default_glyph")]
    pub icon: String,
}

impl DynamicAppConfig {
    /// Builds a descriptor from importer input; a blank icon falls back to a document glyph.
    ///
    /// # Errors
    ///
    /// Returns a message when `name` yields no usable id.
    pub fn from_import(name: &str, icon: &str) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("an app name is required".to_string());
        }
        let icon = icon.trim();
        Ok(Self {
            app_id: ApplicationId::for_user_app(name)?,
            name: name.to_string(),
            icon: if icon.is_empty() {
                default_glyph()
            } else {
                icon.to_string()
            },
        })
    }

    pub fn registration(&self) -> AppRegistration {
        let mut registration =
            AppRegistration::new(self.app_id.clone(), self.name.clone(), self.icon.clone());
        registration.show_on_desktop = true;
        registration.window_defaults = DYNAMIC_APP_WINDOW_DEFAULTS;
        registration
    }
}

/// Folder holding one dynamic app's files.
pub fn dynamic_app_dir(app_id: &ApplicationId) -> String {
    join_child(USER_APPS_DIR, app_id.as_str(), true)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Launcher and instance for an HTML app rendered inside a sandboxed frame.
pub struct SandboxedHtmlApp {
    html: Rc<str>,
}

impl SandboxedHtmlApp {
    pub fn new(html: &str) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// `srcdoc` attribute value for the hosting frame.
    pub fn srcdoc(&self) -> String {
        escape_html(&self.html)
    }

    pub fn sandbox_flags(&self) -> &'static str {
        SANDBOX_FLAGS
    }
}

impl Launchable for SandboxedHtmlApp {
    fn launch(&self, _context: AppLaunchContext) -> Result<Box<dyn AppInstance>, LaunchError> {
        Ok(Box::new(self.clone()))
    }
}

impl AppInstance for SandboxedHtmlApp {
    fn snapshot(&self) -> Value {
        json!({ "sandbox": SANDBOX_FLAGS, "srcdoc": self.srcdoc() })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Extension named by a `data:<type>/<ext>;...` URL.
fn data_url_extension(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let slash = rest.find('/')?;
    let semicolon = rest.find(';')?;
    rest.get(slash + 1..semicolon)
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
}

/// Registers an HTML app so it can be launched at once, then persists it under
/// `/user_apps/<id>/` when the file system is ready.
///
/// Returns whether the app was persisted.
///
/// # Errors
///
/// Returns the first failing VFS write. The in-memory registration stays in place.
pub async fn register_dynamic_app(
    vfs: &VfsService,
    registry: &mut AppRegistry,
    config: &DynamicAppConfig,
    html: Option<&str>,
    icon_data_url: Option<&str>,
) -> Result<bool, VfsError> {
    registry.register(
        config.registration(),
        Rc::new(SandboxedHtmlApp::new(html.unwrap_or_default())),
    );
    logging::log!("registered dynamic app `{}`", config.app_id);

    if !vfs.is_ready() {
        logging::warn!(
            "file system not ready; dynamic app `{}` will not be persisted",
            config.app_id
        );
        return Ok(false);
    }

    let dir = dynamic_app_dir(&config.app_id);
    vfs.create_folder(&dir).await?;
    let descriptor = serde_json::to_string(config)
        .map_err(|err| VfsError::Storage(format!("app descriptor did not encode: {err}")))?;
    vfs.create_file(&format!("{dir}{CONFIG_FILE_NAME}"), &descriptor, true)
        .await?;
    if let Some(html) = html {
        vfs.create_file(&format!("{dir}{CONTENT_FILE_NAME}"), html, true)
            .await?;
    }
    if let Some(icon) = icon_data_url {
        match data_url_extension(icon) {
            Some(ext) => {
                vfs.create_file(&format!("{dir}icon.{ext}"), icon, true).await?;
            }
            None => logging::warn!("ignoring icon for `{}`: not a data URL", config.app_id),
        }
    }
    Ok(true)
}

/// Re-registers every app persisted under `/user_apps/`. Broken entries are skipped.
///
/// Returns the number of apps registered.
///
/// # Errors
///
/// Returns an error when `/user_apps/` itself cannot be listed.
pub async fn load_dynamic_apps(
    vfs: &VfsService,
    registry: &mut AppRegistry,
) -> Result<usize, VfsError> {
    let mut loaded = 0;
    for entry in vfs.list_directory(USER_APPS_DIR).await? {
        if !entry.is_folder() {
            continue;
        }
        let config_path = format!("{}{CONFIG_FILE_NAME}", entry.path);
        let config = match vfs.get_item(&config_path).await {
            Ok(Some(item)) => serde_json::from_str::<DynamicAppConfig>(item.content().unwrap_or_default()),
            Ok(None) => {
                logging::warn!("`{}` has no {CONFIG_FILE_NAME}; skipped", entry.path);
                continue;
            }
            Err(err) => {
                logging::warn!("could not read `{config_path}`: {err}");
                continue;
            }
        };
        let config = match config {
            Ok(config) => config,
            Err(err) => {
                logging::warn!("`{config_path}` is not a valid app descriptor: {err}");
                continue;
            }
        };
        let html = match vfs
            .get_item(&format!("{}{CONTENT_FILE_NAME}", entry.path))
            .await
        {
            Ok(Some(item)) => item.content().unwrap_or_default().to_string(),
            _ => String::new(),
        };
        registry.register(config.registration(), Rc::new(SandboxedHtmlApp::new(&html)));
        loaded += 1;
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryVfsStore;
    use pretty_assertions::assert_eq;

    use super::*;

    fn ready_vfs() -> VfsService {
        let vfs = VfsService::new(Rc::new(MemoryVfsStore::default()));
        block_on(vfs.init()).expect("init");
        vfs
    }

    fn content(vfs: &VfsService, path: &str) -> Option<String> {
        block_on(vfs.get_item(path))
            .expect("get")
            .and_then(|item| item.content().map(str::to_string))
    }

    #[test]
    fn import_input_becomes_a_user_app_descriptor() {
        let config = DynamicAppConfig::from_import("  Pixel Pad ", " ").expect("config");
        assert_eq!(config.app_id.as_str(), "user.pixel-pad");
        assert_eq!(config.icon, "📄");
        assert!(DynamicAppConfig::from_import("   ", "🚀").is_err());

        let registration = config.registration();
        assert!(registration.show_on_desktop);
        assert_eq!(registration.window_defaults, DYNAMIC_APP_WINDOW_DEFAULTS);
    }

    #[test]
    fn registration_persists_descriptor_content_and_icon() {
        let vfs = ready_vfs();
        let mut registry = AppRegistry::default();
        let config = DynamicAppConfig::from_import("Hello", "👋").expect("config");

        let persisted = block_on(register_dynamic_app(
            &vfs,
            &mut registry,
            &config,
            Some("<h1>hi</h1>"),
            Some("data:image/png;base64,AAAA"),
        ))
        .expect("register");

        assert!(persisted);
        assert!(registry.contains(&config.app_id));
        let dir = dynamic_app_dir(&config.app_id);
        assert_eq!(dir, "/user_apps/user.hello/");
        assert_eq!(content(&vfs, "/user_apps/user.hello/index.html").as_deref(), Some("<h1>hi</h1>"));
        assert_eq!(
            content(&vfs, "/user_apps/user.hello/icon.png").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        let stored: DynamicAppConfig = serde_json::from_str(
            &content(&vfs, "/user_apps/user.hello/config.json").expect("config file"),
        )
        .expect("decode");
        assert_eq!(stored, config);
    }

    #[test]
    fn registration_before_init_is_launchable_but_not_persisted() {
        let vfs = VfsService::new(Rc::new(MemoryVfsStore::default()));
        let mut registry = AppRegistry::default();
        let config = DynamicAppConfig::from_import("Later", "").expect("config");

        let persisted =
            block_on(register_dynamic_app(&vfs, &mut registry, &config, None, None)).expect("register");

        assert!(!persisted);
        assert!(registry.contains(&config.app_id));
    }

    #[test]
    fn persisted_apps_reload_into_a_fresh_registry() {
        let vfs = ready_vfs();
        let mut registry = AppRegistry::default();
        for name in ["One", "Two"] {
            let config = DynamicAppConfig::from_import(name, "").expect("config");
            block_on(register_dynamic_app(&vfs, &mut registry, &config, Some(name), None))
                .expect("register");
        }
        block_on(vfs.create_folder("/user_apps/broken")).expect("folder");

        let mut fresh = AppRegistry::default();
        assert_eq!(block_on(load_dynamic_apps(&vfs, &mut fresh)).expect("load"), 2);
        let ids: Vec<&str> = fresh.registrations().map(|r| r.app_id.as_str()).collect();
        assert_eq!(ids, vec!["user.one", "user.two"]);
    }

    #[test]
    fn sandboxed_frame_escapes_markup() {
        let app = SandboxedHtmlApp::new("<p class=\"x\">Tom & 'Jerry'</p>");
        assert_eq!(
            app.srcdoc(),
            "&lt;p class=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/p&gt;"
        );
        assert!(!app.sandbox_flags().contains("allow-same-origin"));
    }

    #[test]
    fn icon_extension_comes_from_the_media_type() {
        assert_eq!(data_url_extension("data:image/svg+xml;utf8,<svg/>"), Some("svg+xml"));
        assert_eq!(data_url_extension("https://example.com/a.png"), None);
        assert_eq!(data_url_extension("data:image;base64,AA"), None);
    }
}
