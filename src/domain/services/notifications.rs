#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use crate::domain::models::Notification;

/// Holds the single visible notification. Transient ones hide themselves
/// after `timeout`; a critical one stays until the client restarts.
pub struct Notifier {
    current: Option<Notification>,
    shown_at: Option<Instant>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Notifier {
        return Notifier {
            current: None,
            shown_at: None,
            timeout,
        };
    }

    pub fn current(&self) -> Option<&Notification> {
        return self.current.as_ref();
    }

    pub fn is_critical(&self) -> bool {
        return self
            .current
            .as_ref()
            .map(|notification| return notification.is_critical())
            .unwrap_or(false);
    }

    /// Returns false when a critical notification is pinned and the new one
    /// was dropped.
    pub fn show(&mut self, notification: Notification, now: Instant) -> bool {
        if self.is_critical() {
            tracing::debug!(
                text = notification.text.as_str(),
                "Dropping notification, critical is pinned"
            );
            return false;
        }

        self.shown_at = Some(now);
        self.current = Some(notification);
        return true;
    }

    /// Hides an expired transient notification. Returns true if anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.is_critical() {
            return false;
        }

        if let Some(shown_at) = self.shown_at {
            if now.saturating_duration_since(shown_at) >= self.timeout {
                self.current = None;
                self.shown_at = None;
                return true;
            }
        }

        return false;
    }

    pub fn clear(&mut self) {
        if self.is_critical() {
            return;
        }

        self.current = None;
        self.shown_at = None;
    }
}
