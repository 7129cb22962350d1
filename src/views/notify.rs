//! Transient user notifications.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::vault::action::ActionId;

/// Oldest notifications are dropped past this many undrained entries.
const MAX_PENDING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<ActionId>,
}

/// Queue of notifications waiting to be shown.
#[derive(Debug, Default)]
pub struct Notifier {
    queue: Mutex<VecDeque<Notification>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>, action_id: Option<ActionId>) {
        self.push(NotificationLevel::Success, message.into(), action_id);
    }

    pub fn error(&self, message: impl Into<String>, action_id: Option<ActionId>) {
        self.push(NotificationLevel::Error, message.into(), action_id);
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    fn push(&self, level: NotificationLevel, message: String, action_id: Option<ActionId>) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_PENDING {
            queue.pop_front();
        }
        queue.push_back(Notification {
            level,
            message,
            action_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let notifier = Notifier::new();
        notifier.success("Ping transaction submitted!", None);
        notifier.error("Failed to ping vault", None);

        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Success);
        assert_eq!(drained[1].message, "Failed to ping vault");
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn test_bounded_queue() {
        let notifier = Notifier::new();
        for i in 0..(MAX_PENDING + 3) {
            notifier.error(format!("error {}", i), None);
        }
        let drained = notifier.drain();
        assert_eq!(drained.len(), MAX_PENDING);
        assert_eq!(drained[0].message, "error 3");
    }
}
