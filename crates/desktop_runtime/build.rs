use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MANIFEST_SUFFIX: &str = ".app.manifest.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WindowDefaults {
    width: i32,
    height: i32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppManifest {
    #[serde(skip_serializing)]
    schema_version: u32,
    app_id: String,
    display_name: String,
    glyph: String,
    #[serde(default)]
    single_instance: bool,
    #[serde(default)]
    show_on_desktop: bool,
    #[serde(default = "default_true")]
    show_in_launcher: bool,
    #[serde(default)]
    modal: bool,
    #[serde(default = "default_true")]
    resizable: bool,
    #[serde(default = "default_true")]
    maximizable: bool,
    #[serde(default = "default_true")]
    auto_focus_content: bool,
    #[serde(default)]
    requires_file_system: bool,
    window_defaults: WindowDefaults,
}

fn app_manifest_paths(root: &Path) -> Vec<PathBuf> {
    let dir = root.join("apps");
    let entries = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", dir.display()));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(MANIFEST_SUFFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    paths
}

fn validate(path: &Path, manifest: &AppManifest) {
    if manifest.schema_version != 1 {
        panic!(
            "manifest schema mismatch in {}: expected 1 found {}",
            path.display(),
            manifest.schema_version
        );
    }
    let segments: Vec<&str> = manifest.app_id.split('.').collect();
    if segments.len() < 2 || segments.iter().any(|segment| segment.is_empty()) {
        panic!(
            "invalid app id `{}` in {}: expected namespaced dotted segments",
            manifest.app_id,
            path.display()
        );
    }
    if manifest.window_defaults.width <= 0 || manifest.window_defaults.height <= 0 {
        panic!("window defaults must be positive in {}", path.display());
    }
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    println!("cargo:rerun-if-changed={}", crate_root.join("apps").display());
    let mut manifests = Vec::<AppManifest>::new();

    for path in app_manifest_paths(&crate_root) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: AppManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        validate(&path, &manifest);
        if manifests.iter().any(|known| known.app_id == manifest.app_id) {
            panic!("duplicate app id `{}` in {}", manifest.app_id, path.display());
        }
        manifests.push(manifest);
    }

    manifests.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    let json = serde_json::to_string_pretty(&manifests).expect("serialize app manifest catalog");
    let generated = format!(
        "/// Build-time generated app manifest catalog JSON.\n\
pub const APP_MANIFEST_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("app_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
