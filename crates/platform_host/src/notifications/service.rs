//! Notification service contracts and adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`NotificationService`].
pub type NotificationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for transient user-visible notifications (toasts).
pub trait NotificationService {
    /// Dispatches a notification message.
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op notification service for hosts without a toast surface.
pub struct NoopNotificationService;

impl NotificationService for NoopNotificationService {
    fn notify<'a>(
        &'a self,
        _title: &'a str,
        _body: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One notification captured by [`MemoryNotificationService`].
pub struct NotificationRecord {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

#[derive(Debug, Clone, Default)]
/// Notification service that records every message; clones share the log.
pub struct MemoryNotificationService {
    sent: Rc<RefCell<Vec<NotificationRecord>>>,
}

impl MemoryNotificationService {
    /// Returns every notification dispatched so far.
    pub fn sent(&self) -> Vec<NotificationRecord> {
        self.sent.borrow().clone()
    }
}

impl NotificationService for MemoryNotificationService {
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.sent.borrow_mut().push(NotificationRecord {
                title: title.to_string(),
                body: body.to_string(),
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn memory_service_records_messages_in_order() {
        let service = MemoryNotificationService::default();
        let service_obj: &dyn NotificationService = &service;
        block_on(service_obj.notify("File Error", "disk full")).expect("notify");
        block_on(service_obj.notify("Saved", "notes.txt")).expect("notify");

        let sent = service.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].title, "File Error");
        assert_eq!(sent[1].body, "notes.txt");
    }
}
