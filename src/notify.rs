use std::time::{Duration, Instant};

/// How long a notification stays on screen.
pub const NOTIFY_TTL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub success: bool,
    pub created_at: Instant,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
            created_at: Instant::now(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= NOTIFY_TTL
    }
}

/// Everything currently on screen. Several may be visible at once and nothing
/// is deduplicated.
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        if notification.success {
            tracing::info!(message = %notification.message, "notify");
        } else {
            tracing::warn!(message = %notification.message, "notify");
        }
        self.items.push(notification);
    }

    /// Drops expired entries, returns true when something was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before != self.items.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_and_duplicates_kept() {
        let mut n = Notifications::default();
        n.push(Notification::success("Data loaded"));
        n.push(Notification::success("Data loaded"));
        n.push(Notification::failure("Sync failed"));
        assert_eq!(n.active().len(), 3);
        assert!(!n.active()[2].success);
    }

    #[test]
    fn test_prune_after_ttl() {
        let mut n = Notifications::default();
        let first = Notification::success("old");
        let created = first.created_at;
        n.push(first);

        assert!(!n.prune(created + Duration::from_millis(2499)));
        assert_eq!(n.active().len(), 1);

        let mut late = Notification::failure("new");
        late.created_at = created + Duration::from_secs(2);
        n.push(late);

        assert!(n.prune(created + NOTIFY_TTL));
        assert_eq!(n.active().len(), 1);
        assert_eq!(n.active()[0].message, "new");

        assert!(n.prune(created + Duration::from_secs(5)));
        assert!(n.is_empty());
    }
}
