//! Toast notifications
//!
//! A list of notifications driven by a small reducer. Showing a notification with
//! a non-zero duration schedules its removal; `hide` removes it early.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use dioxus::{core::spawn_forever, prelude::*};
use rand::Rng;

/// Default time a notification stays visible, in milliseconds
pub const DEFAULT_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Milliseconds until removal; 0 keeps it until hidden
    pub duration: u64,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: u64,
    ) -> Self {
        Self {
            id: next_id(),
            kind,
            title: title.into(),
            message: message.into(),
            duration,
        }
    }
}

/// Millisecond timestamp plus a random suffix
fn next_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("{millis}-{suffix:08x}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Show(Notification),
    Hide(String),
    Clear,
}

/// Applies `action` to `list`
pub fn reduce(list: &mut Vec<Notification>, action: NotificationAction) {
    match action {
        NotificationAction::Show(notification) => list.push(notification),
        NotificationAction::Hide(id) => list.retain(|n| n.id != id),
        NotificationAction::Clear => list.clear(),
    }
}

/// Notification list usable outside of a component tree
///
/// Removal timers run on the ambient tokio runtime. Without one, notifications
/// stay until hidden.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    items: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn dispatch(&self, action: NotificationAction) {
        if let Ok(mut items) = self.items.lock() {
            reduce(&mut items, action);
        }
    }

    /// Appends a notification and returns its id
    pub fn show(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> String {
        let notification = Notification::new(kind, title, message, duration_ms);
        let id = notification.id.clone();
        self.dispatch(NotificationAction::Show(notification));

        if duration_ms > 0 {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let center = self.clone();
                    let expired = id.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                        center.hide(&expired);
                    });
                }
                Err(_) => {
                    crate::debug_log!("🔔 [NOTIFY] No runtime, '{}' will not auto-hide", id);
                }
            }
        }
        id
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> String {
        self.show(NotificationKind::Success, title, message, DEFAULT_DURATION_MS)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> String {
        self.show(NotificationKind::Error, title, message, DEFAULT_DURATION_MS)
    }

    pub fn hide(&self, id: &str) {
        self.dispatch(NotificationAction::Hide(id.to_string()));
    }

    pub fn clear(&self) {
        self.dispatch(NotificationAction::Clear);
    }

    /// Snapshot of the visible notifications, oldest first
    pub fn list(&self) -> Vec<Notification> {
        self.items
            .lock()
            .map(|items| items.clone())
            .unwrap_or_default()
    }
}

/// Notifications as seen by components
#[derive(Clone, Copy)]
pub struct NotificationContext {
    items: Signal<Vec<Notification>>,
}

impl NotificationContext {
    pub fn list(&self) -> Vec<Notification> {
        self.items.read().clone()
    }

    fn dispatch(&self, action: NotificationAction) {
        let mut items = self.items;
        // The provider may be gone by the time a removal timer fires
        if let Ok(mut items) = items.try_write() {
            reduce(&mut items, action);
        }
    }

    pub fn show(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> String {
        let notification = Notification::new(kind, title, message, duration_ms);
        let id = notification.id.clone();
        self.dispatch(NotificationAction::Show(notification));

        if duration_ms > 0 {
            let context = *self;
            let expired = id.clone();
            // Outlives the component that raised it
            spawn_forever(async move {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                context.hide(&expired);
            });
        }
        id
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> String {
        self.show(NotificationKind::Success, title, message, DEFAULT_DURATION_MS)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> String {
        self.show(NotificationKind::Error, title, message, DEFAULT_DURATION_MS)
    }

    pub fn hide(&self, id: &str) {
        self.dispatch(NotificationAction::Hide(id.to_string()));
    }

    pub fn clear(&self) {
        self.dispatch(NotificationAction::Clear);
    }
}

pub fn use_notification_provider() -> NotificationContext {
    use_context_provider(|| NotificationContext {
        items: Signal::new(Vec::new()),
    })
}

pub fn use_notifications() -> NotificationContext {
    use_context()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reducer_shows_hides_and_clears() {
        let mut list = Vec::new();
        let a = Notification::new(NotificationKind::Info, "a", "", 0);
        let b = Notification::new(NotificationKind::Error, "b", "", 0);
        let a_id = a.id.clone();

        reduce(&mut list, NotificationAction::Show(a));
        reduce(&mut list, NotificationAction::Show(b));
        assert_eq!(list.len(), 2);

        reduce(&mut list, NotificationAction::Hide(a_id));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "b");

        reduce(&mut list, NotificationAction::Hide("missing".into()));
        assert_eq!(list.len(), 1);

        reduce(&mut list, NotificationAction::Clear);
        assert!(list.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let a = Notification::new(NotificationKind::Info, "", "", 0);
        let b = Notification::new(NotificationKind::Info, "", "", 0);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn notification_is_removed_after_its_duration() {
        let center = NotificationCenter::new();
        center.show(NotificationKind::Success, "Saved", "Booking confirmed", 100);
        assert_eq!(center.list().len(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(center.list().is_empty());
    }

    #[tokio::test]
    async fn zero_duration_stays_until_hidden() {
        let center = NotificationCenter::new();
        let id = center.show(NotificationKind::Warning, "Offline", "", 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(center.list().len(), 1);

        center.hide(&id);
        assert!(center.list().is_empty());
    }
}
