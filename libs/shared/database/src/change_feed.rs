use tokio::sync::broadcast;
use tracing::debug;

use shared_models::events::RecordChange;

pub type ChangeReceiver = broadcast::Receiver<RecordChange>;

/// Fan-out of committed writes. Services publish after a successful store
/// write; listeners that lag behind the channel capacity miss old events.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<RecordChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> ChangeReceiver {
        self.sender.subscribe()
    }

    /// Returns the number of listeners that received the change.
    pub fn publish(&self, change: RecordChange) -> usize {
        match self.sender.send(change) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(change)) => {
                debug!("No listeners for {:?} change on {:?}", change.kind, change.table);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::events::{ChangeKind, Table};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_published_changes() {
        let feed = ChangeFeed::default();
        let mut receiver = feed.subscribe();
        let id = Uuid::new_v4();

        assert_eq!(feed.publish(RecordChange::inserted(Table::Appointments, id)), 1);

        let change = receiver.recv().await.unwrap();
        assert_eq!(change.record_id, id);
        assert_eq!(change.kind, ChangeKind::Inserted);
    }

    #[test]
    fn test_publish_without_listeners_is_not_an_error() {
        let feed = ChangeFeed::new(4);
        assert_eq!(feed.publish(RecordChange::updated(Table::Doctors, Uuid::new_v4())), 0);
    }
}
