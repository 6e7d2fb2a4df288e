//! Live app sessions owned by the desktop runtime and the command channel apps talk back through.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, VecDeque},
    rc::Rc,
};

use desktop_app_contract::{AppCommand, AppCommandSender, AppInstance, AppLifecycleEvent};

use crate::model::{WindowId, WindowPhase, WindowRecord};

/// One mounted app and the last lifecycle event it received.
pub struct WindowAppSession {
    pub instance: Box<dyn AppInstance>,
    pub lifecycle: AppLifecycleEvent,
}

#[derive(Default)]
/// Runtime-owned app sessions keyed by window.
pub struct AppRuntimeState {
    sessions: BTreeMap<WindowId, WindowAppSession>,
}

impl AppRuntimeState {
    /// Attaches a freshly launched instance to its window and delivers [`AppLifecycleEvent::Mounted`].
    pub fn mount(&mut self, window_id: WindowId, mut instance: Box<dyn AppInstance>) {
        instance.on_lifecycle(AppLifecycleEvent::Mounted);
        self.sessions.insert(
            window_id,
            WindowAppSession {
                instance,
                lifecycle: AppLifecycleEvent::Mounted,
            },
        );
    }

    pub fn contains(&self, window_id: WindowId) -> bool {
        self.sessions.contains_key(&window_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn instance(&self, window_id: WindowId) -> Option<&dyn AppInstance> {
        self.sessions
            .get(&window_id)
            .map(|session| session.instance.as_ref())
    }

    pub fn instance_mut(&mut self, window_id: WindowId) -> Option<&mut Box<dyn AppInstance>> {
        self.sessions
            .get_mut(&window_id)
            .map(|session| &mut session.instance)
    }

    pub fn instances_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn AppInstance>> {
        self.sessions
            .values_mut()
            .map(|session| &mut session.instance)
    }

    pub fn lifecycle(&self, window_id: WindowId) -> Option<AppLifecycleEvent> {
        self.sessions
            .get(&window_id)
            .map(|session| session.lifecycle)
    }

    /// Delivers a lifecycle event. Unknown windows are ignored.
    pub fn set_lifecycle(&mut self, window_id: WindowId, event: AppLifecycleEvent) {
        if let Some(session) = self.sessions.get_mut(&window_id) {
            session.instance.on_lifecycle(event);
            session.lifecycle = event;
        }
    }

    /// Delivers [`AppLifecycleEvent::Closed`] and drops the session.
    pub fn close(&mut self, window_id: WindowId) {
        if let Some(mut session) = self.sessions.remove(&window_id) {
            session.instance.on_lifecycle(AppLifecycleEvent::Closed);
        }
    }

    /// Drops sessions whose window no longer exists.
    pub fn sync_windows(&mut self, windows: &[WindowRecord]) {
        let active: BTreeSet<WindowId> = windows.iter().map(|window| window.id).collect();
        self.sessions
            .retain(|window_id, _| active.contains(window_id));
    }
}

/// Lifecycle events implied by a window-list change, in window order.
///
/// Only windows present on both sides are considered; mount and close are delivered explicitly.
pub fn lifecycle_transitions(
    previous: &[WindowRecord],
    next: &[WindowRecord],
) -> Vec<(WindowId, AppLifecycleEvent)> {
    let mut events = Vec::new();
    for after in next {
        let Some(before) = previous.iter().find(|window| window.id == after.id) else {
            continue;
        };
        if after.phase == WindowPhase::Closing && before.phase != WindowPhase::Closing {
            events.push((after.id, AppLifecycleEvent::Closing));
        }
        if !before.minimized && after.minimized {
            events.push((after.id, AppLifecycleEvent::Minimized));
        } else if (before.minimized && !after.minimized)
            || (before.maximized && !after.maximized && !after.minimized)
        {
            events.push((after.id, AppLifecycleEvent::Restored));
        }
        if before.is_focused && !after.is_focused {
            events.push((after.id, AppLifecycleEvent::Blurred));
        } else if !before.is_focused && after.is_focused {
            events.push((after.id, AppLifecycleEvent::Focused));
        }
    }
    events
}

#[derive(Clone, Default)]
/// FIFO of commands sent by app instances, drained by the runtime.
pub struct AppCommandQueue {
    pending: Rc<RefCell<VecDeque<(WindowId, AppCommand)>>>,
}

impl AppCommandQueue {
    /// Sender handed to app services.
    pub fn sender(&self) -> AppCommandSender {
        let pending = Rc::clone(&self.pending);
        Rc::new(move |window_id, command| {
            pending
                .borrow_mut()
                .push_back((WindowId(window_id), command));
        })
    }

    pub fn pop(&self) -> Option<(WindowId, AppCommand)> {
        self.pending.borrow_mut().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}
