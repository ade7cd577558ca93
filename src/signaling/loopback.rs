use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use crate::{
    ice::CandidateRecord,
    log::LogSink,
    signaling::{
        HandlerRegistry, MessageHandler, SignalingChannel, SignalingError, SignalingMessage,
        SubscriptionId,
    },
    sink_debug, sink_info, sink_warn,
};

/// Placeholder answer used when no SDP was configured.
pub const MOCK_ANSWER_SDP: &str = "mock-sdp-answer";

/// Simulated remote peer: every offer is answered after `answer_delay`,
/// followed by the configured remote candidates. Local candidates are
/// accepted and dropped.
pub struct LoopbackSignalingChannel {
    registry: Arc<HandlerRegistry>,
    answer_delay: Duration,
    answer_sdp: String,
    remote_candidates: Vec<CandidateRecord>,
    sent: Mutex<Vec<SignalingMessage>>,
    logger: Arc<dyn LogSink>,
}

impl LoopbackSignalingChannel {
    pub fn new(answer_delay: Duration, logger: Arc<dyn LogSink>) -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::new()),
            answer_delay,
            answer_sdp: MOCK_ANSWER_SDP.to_owned(),
            remote_candidates: Vec::new(),
            sent: Mutex::new(Vec::new()),
            logger,
        }
    }

    #[must_use]
    pub fn with_answer_sdp(mut self, sdp: impl Into<String>) -> Self {
        self.answer_sdp = sdp.into();
        self
    }

    #[must_use]
    pub fn with_remote_candidates(mut self, candidates: Vec<CandidateRecord>) -> Self {
        self.remote_candidates = candidates;
        self
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SignalingMessage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn schedule_answer(&self) {
        let registry = Arc::clone(&self.registry);
        let delay = self.answer_delay;
        let answer = SignalingMessage::answer(self.answer_sdp.clone());
        let candidates = self.remote_candidates.clone();
        let logger = Arc::clone(&self.logger);

        let spawned = thread::Builder::new()
            .name("loopback-answer".into())
            .spawn(move || {
                thread::sleep(delay);
                let reached = registry.dispatch(&answer);
                sink_info!(logger, "[SIGNALING] loopback answered offer ({reached} subscriber(s))");
                for cand in candidates {
                    registry.dispatch(&SignalingMessage::candidate(cand));
                }
            });
        if let Err(e) = spawned {
            sink_warn!(self.logger, "[SIGNALING] could not spawn loopback answerer: {e}");
        }
    }
}

impl SignalingChannel for LoopbackSignalingChannel {
    fn send(&self, msg: &SignalingMessage) -> Result<(), SignalingError> {
        let mut guard = self.sent.lock().map_err(|_| SignalingError::Disconnected)?;
        guard.push(msg.clone());
        drop(guard);

        sink_debug!(self.logger, "[SIGNALING] loopback <- {}", msg.kind());
        if matches!(msg, SignalingMessage::Offer { .. }) {
            self.schedule_answer();
        }
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId {
        self.registry.add(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.remove(id);
    }
}
