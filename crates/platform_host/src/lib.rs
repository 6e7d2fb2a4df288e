//! Typed host-domain contracts and shared models for the web desktop.
//!
//! This crate is the API-first boundary between the desktop runtime and its host: the virtual
//! filesystem (path model, records, store contract, service, change feed), preference storage,
//! notifications, modal dialogs, and clock sources. It holds no UI state.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod dialogs;
pub mod fs;
pub mod host;
pub mod notifications;
pub mod storage;
pub mod time;

pub use dialogs::{
    DialogAnswer, DialogFuture, DialogService, NoopDialogService, ScriptedDialogService,
};
pub use fs::changes::{SubscriptionId, VfsChange, VfsChangeFeed};
pub use fs::error::VfsError;
pub use fs::path::{
    canonical_path, is_within, join_child, normalize_dir, normalize_virtual_path, parse_path,
    rebase, PathInfo, ROOT_PATH,
};
pub use fs::service::{DeleteOutcome, RestoreOutcome, VfsService};
pub use fs::store::{MemoryVfsStore, NoopVfsStore, StoreOp, VfsStore, VfsStoreFuture};
pub use fs::types::{
    file_extension, mime_type_for_name, sort_for_display, RecycleTag, VfsItem, VfsItemKind,
    BASE_DIRECTORIES, DESKTOP_DIR, DOCUMENTS_DIR, DOWNLOADS_DIR, PICTURES_DIR, RECYCLE_BIN_DIR,
    USER_APPS_DIR,
};
pub use host::HostServices;
pub use notifications::{
    MemoryNotificationService, NoopNotificationService, NotificationFuture, NotificationRecord,
    NotificationService,
};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, PrefsStore,
    PrefsStoreFuture, ICON_LAYOUT_PREFS_KEY, SHELL_CONFIG_PREFS_KEY,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
