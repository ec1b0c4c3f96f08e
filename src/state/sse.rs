use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_broadcasts() {
        let hub = SseHub::new(4);
        let mut rx = hub.subscribe();
        hub.broadcast(ServerEvent::new(Some("status".into()), "hello".into()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("status"));
        assert_eq!(event.data, "hello");
    }

    #[test]
    fn broadcasting_without_subscribers_is_fine() {
        SseHub::new(1).broadcast(ServerEvent::new(None, "dropped".into()));
    }
}
