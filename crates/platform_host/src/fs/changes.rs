//! Directory change notifications published after successful VFS mutations.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Change published by the VFS once per affected directory.
pub enum VfsChange {
    /// Children of `dir_path` were added, removed, or modified.
    DirectoryChanged {
        /// Canonical folder path.
        dir_path: String,
    },
}

impl VfsChange {
    /// Returns the directory this change concerns.
    pub fn dir_path(&self) -> &str {
        match self {
            Self::DirectoryChanged { dir_path } => dir_path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Handle returned by [`VfsChangeFeed::subscribe`].
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&VfsChange)>;

#[derive(Clone, Default)]
/// Fan-out of [`VfsChange`] events to registered listeners.
pub struct VfsChangeFeed {
    listeners: Rc<RefCell<Vec<(SubscriptionId, Listener)>>>,
    next_id: Rc<Cell<u64>>,
}

impl VfsChangeFeed {
    /// Registers a listener and returns its handle.
    pub fn subscribe(&self, listener: impl Fn(&VfsChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when the handle was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `change` to every listener.
    ///
    /// Listeners may subscribe or unsubscribe while being notified; they see the list as it was
    /// when publishing began.
    pub fn publish(&self, change: &VfsChange) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(change);
        }
    }
}
