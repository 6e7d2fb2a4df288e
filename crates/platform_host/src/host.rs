//! Host service bundle injected into the desktop runtime.

use std::rc::Rc;

use crate::{
    DialogService, MemoryNotificationService, MemoryPrefsStore, MemoryVfsStore,
    NotificationService, PrefsStore, ScriptedDialogService, VfsService,
};

/// Runtime-selected host services.
///
/// Environment-specific adapter selection happens before this bundle crosses into
/// `desktop_runtime`, so the runtime only sees trait objects and the shared [`VfsService`].
#[derive(Clone)]
pub struct HostServices {
    /// Lightweight typed preference store (layout, shell settings).
    pub prefs: Rc<dyn PrefsStore>,
    /// Notification delivery service.
    pub notifications: Rc<dyn NotificationService>,
    /// Confirm/prompt dialogs.
    pub dialogs: Rc<dyn DialogService>,
    /// Virtual filesystem shared by the shell and every app.
    pub vfs: VfsService,
}

impl HostServices {
    /// Bundles explicit adapters.
    pub fn new(
        prefs: Rc<dyn PrefsStore>,
        notifications: Rc<dyn NotificationService>,
        dialogs: Rc<dyn DialogService>,
        vfs: VfsService,
    ) -> Self {
        Self {
            prefs,
            notifications,
            dialogs,
            vfs,
        }
    }

    /// Builds a fully in-memory bundle. The VFS still needs [`VfsService::init`].
    pub fn in_memory() -> Self {
        Self::new(
            Rc::new(MemoryPrefsStore::default()),
            Rc::new(MemoryNotificationService::default()),
            Rc::new(ScriptedDialogService::default()),
            VfsService::new(Rc::new(MemoryVfsStore::default())),
        )
    }
}
