use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use crate::signaling::{
    HandlerRegistry, MessageHandler, SignalingChannel, SignalingError, SignalingMessage,
    SubscriptionId,
};

/// In-process channel: records what was sent and lets the caller play the
/// remote side with [`inject`](Self::inject).
#[derive(Default)]
pub struct InMemorySignalingChannel {
    registry: HandlerRegistry,
    sent: Mutex<Vec<SignalingMessage>>,
    reject_sends: AtomicBool,
}

impl InMemorySignalingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `msg` to subscribers as if it came from the remote peer.
    /// Returns the number of handlers reached.
    pub fn inject(&self, msg: SignalingMessage) -> usize {
        self.registry.dispatch(&msg)
    }

    /// When set, every subsequent `send` fails with [`SignalingError::Rejected`].
    pub fn set_reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SignalingMessage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn sent_of_kind(&self, kind: &str) -> Vec<SignalingMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.kind() == kind)
            .collect()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl SignalingChannel for InMemorySignalingChannel {
    fn send(&self, msg: &SignalingMessage) -> Result<(), SignalingError> {
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(SignalingError::Rejected("send rejected".into()));
        }
        let mut guard = self.sent.lock().map_err(|_| SignalingError::Disconnected)?;
        guard.push(msg.clone());
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId {
        self.registry.add(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.remove(id);
    }
}
