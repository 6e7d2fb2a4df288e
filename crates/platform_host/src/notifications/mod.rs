//! User-visible notification contracts.

pub mod service;

pub use service::{
    MemoryNotificationService, NoopNotificationService, NotificationFuture, NotificationRecord,
    NotificationService,
};
