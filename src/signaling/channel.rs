use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use crate::signaling::{SignalingError, SignalingMessage};

/// Callback invoked for every inbound message. May run on a transport thread.
pub type MessageHandler = Box<dyn Fn(SignalingMessage) + Send + Sync>;

/// Token returned by [`SignalingChannel::on_message`]; pass it back to
/// [`SignalingChannel::unsubscribe`] to stop delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Message transport towards the remote peer.
///
/// The channel relays messages verbatim; it does not interpret them.
pub trait SignalingChannel: Send + Sync {
    /// # Errors
    /// Returns a [`SignalingError`] when the message cannot be handed to the
    /// transport.
    fn send(&self, msg: &SignalingMessage) -> Result<(), SignalingError>;

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId;

    /// Stops delivery to the given subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Subscriber bookkeeping shared by the bundled channels.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Arc<MessageHandler>)>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handler: MessageHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut guard) = self.handlers.lock() {
            guard.push((id, Arc::new(handler)));
        }
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        if let Ok(mut guard) = self.handlers.lock() {
            guard.retain(|(sid, _)| *sid != id);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.lock().map(|g| g.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `msg` to every current subscriber, in subscription order.
    /// Handlers run outside the lock so they may subscribe or unsubscribe.
    pub fn dispatch(&self, msg: &SignalingMessage) -> usize {
        let snapshot: Vec<Arc<MessageHandler>> = match self.handlers.lock() {
            Ok(guard) => guard.iter().map(|(_, h)| Arc::clone(h)).collect(),
            Err(_) => return 0,
        };
        for handler in &snapshot {
            handler(msg.clone());
        }
        snapshot.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn dispatch_reaches_only_live_subscribers() {
        let reg = HandlerRegistry::new();
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let a = reg.add(Box::new(move |m| {
            let _ = tx_a.send(m);
        }));
        let _b = reg.add(Box::new(move |m| {
            let _ = tx_b.send(m);
        }));

        assert_eq!(reg.dispatch(&SignalingMessage::offer("x")), 2);
        reg.remove(a);
        assert_eq!(reg.dispatch(&SignalingMessage::answer("y")), 1);

        assert_eq!(rx_a.try_iter().count(), 1);
        assert_eq!(rx_b.try_iter().count(), 2);
        assert_eq!(reg.len(), 1);
    }
}
