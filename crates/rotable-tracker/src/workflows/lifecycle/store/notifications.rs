use std::sync::Mutex;

use tracing::info;

use crate::workflows::lifecycle::repository::{Notification, NotificationError, NotificationSink};

/// Keeps every notification in memory so callers can inspect what was announced.
#[derive(Default)]
pub struct InMemoryNotifications {
    sent: Mutex<Vec<Notification>>,
}

impl InMemoryNotifications {
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for InMemoryNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("notification log poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

/// Emits notifications as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifications;

impl NotificationSink for TracingNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            target: "rotable_tracker::notifications",
            kind = notification.kind.as_str(),
            component_id = %notification.component_id,
            "{}",
            notification.message
        );
        Ok(())
    }
}
