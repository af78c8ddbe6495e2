use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::Notification;
use shared_models::events::{RecordChange, Table};

use crate::models::{NotificationDraft, NotificationError};

pub struct NotificationService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
}

impl NotificationService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    pub async fn notify(&self, draft: NotificationDraft) -> Result<Notification, NotificationError> {
        debug!("Notifying {:?} {}", draft.user_type, draft.user_id);

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            user_type: draft.user_type,
            message: draft.message,
            link: draft.link,
            created_at: Utc::now(),
            read: false,
        };

        let saved = self.store.insert_notification(notification).await?;
        self.feed.publish(RecordChange::inserted(Table::Notifications, saved.id));
        Ok(saved)
    }

    /// Like [`notify`](Self::notify), but a failure is only logged.
    pub async fn notify_or_log(&self, draft: NotificationDraft) -> Option<Notification> {
        let recipient = draft.user_id;
        match self.notify(draft).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!("Failed to notify {}: {}", recipient, e);
                None
            }
        }
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, NotificationError> {
        let mut notifications = self.store.list_notifications(user_id).await?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    /// Marks one of `user_id`'s notifications read. Other users' notifications
    /// are reported as missing.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification, NotificationError> {
        let mut notification = match self.store.get_notification(notification_id).await {
            Ok(n) if n.user_id == user_id => n,
            Ok(_) | Err(StoreError::NotFound { .. }) => {
                return Err(NotificationError::NotFound(notification_id))
            }
            Err(e) => return Err(e.into()),
        };

        if notification.read {
            return Ok(notification);
        }

        notification.read = true;
        let updated = self.store.update_notification(notification).await?;
        self.feed.publish(RecordChange::updated(Table::Notifications, updated.id));
        Ok(updated)
    }
}
