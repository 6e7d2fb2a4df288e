//! Key-value preferences holding the desktop icon layout and shell metric overrides.
//!
//! Values are JSON text; [`load_pref_with`] and [`save_pref_with`] add the typed layer.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{de::DeserializeOwned, Serialize};

/// Persisted desktop icon layout.
pub const ICON_LAYOUT_PREFS_KEY: &str = "webdesk.desktop.icon_layout.v2";
/// Shell metric overrides.
pub const SHELL_CONFIG_PREFS_KEY: &str = "webdesk.shell.config.v1";

pub type PrefsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host preference backend.
pub trait PrefsStore {
    /// Raw JSON stored under `key`, if any.
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>>;

    /// Replaces the JSON stored under `key`.
    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Default)]
/// In-memory preferences; clones share one table.
pub struct MemoryPrefsStore {
    values: Rc<RefCell<BTreeMap<String, String>>>,
    fail_saves: Rc<Cell<bool>>,
}

impl MemoryPrefsStore {
    /// Stored JSON for `key`, read synchronously.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    /// Makes every later save fail, as a full or revoked browser quota would.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.raw(key)) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.fail_saves.get() {
                return Err(format!("preference `{key}` could not be written"));
            }
            self.values
                .borrow_mut()
                .insert(key.to_string(), raw_json.to_string());
            Ok(())
        })
    }
}

/// Reads and decodes `key`. `Ok(None)` when nothing is stored.
///
/// # Errors
///
/// The store error, or the JSON decode error text.
pub async fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    match store.load_pref(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| format!("preference `{key}` is malformed: {err}")),
        None => Ok(None),
    }
}

/// Encodes `value` and stores it under `key`.
///
/// # Errors
///
/// The JSON encode error text, or the store error.
pub async fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|err| err.to_string())?;
    store.save_pref(key, &raw).await
}
