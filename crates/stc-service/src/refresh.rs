//! Screen-refresh trigger fanning out to subscribed peers.

use serde::{Deserialize, Serialize};
use stc_core::{RefreshError, RefreshTrigger};
use tokio::sync::broadcast;

/// Pending events kept per subscriber before it starts lagging.
const REFRESH_CHANNEL_CAPACITY: usize = 16;

/// A request to toggle screen updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshEvent {
    pub enable: bool,
}

/// Publishes refresh events to every subscriber.
#[derive(Clone)]
pub struct ScreenRefresh {
    tx: broadcast::Sender<RefreshEvent>,
}

impl ScreenRefresh {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ScreenRefresh {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTrigger for ScreenRefresh {
    fn toggle_screen_updates(&self, enable: bool) -> Result<(), RefreshError> {
        self.tx
            .send(RefreshEvent { enable })
            .map(|delivered| {
                tracing::debug!("Screen update toggle({enable}) sent to {delivered} subscribers");
            })
            .map_err(|_| RefreshError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subscribers_is_closed() {
        let refresh = ScreenRefresh::new();
        assert!(matches!(
            refresh.toggle_screen_updates(true),
            Err(RefreshError::Closed)
        ));
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let refresh = ScreenRefresh::new();
        let mut first = refresh.subscribe();
        let mut second = refresh.subscribe();
        assert_eq!(refresh.subscriber_count(), 2);

        refresh.toggle_screen_updates(true).unwrap();
        assert_eq!(first.try_recv().unwrap(), RefreshEvent { enable: true });
        assert_eq!(second.try_recv().unwrap(), RefreshEvent { enable: true });
    }
}
