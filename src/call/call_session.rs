use crate::{
    call::{CallState, Generation},
    ice::IceCandidateQueue,
    media::MediaStream,
    peer::{PeerWorker, SessionDescription},
    signaling::SubscriptionId,
};

/// Everything that belongs to one call attempt. Dropped as a whole when the
/// machine returns to `Idle`.
pub struct CallSession {
    pub generation: Generation,
    pub state: CallState,
    pub local_stream: Option<MediaStream>,
    pub remote_stream: Option<MediaStream>,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    /// An answer was handed to the engine and its completion is outstanding.
    pub remote_description_pending: bool,
    /// Local candidates waiting for the local description.
    pub pending_local_candidates: IceCandidateQueue,
    /// Remote candidates waiting for the remote description.
    pub pending_remote_candidates: IceCandidateQueue,
    pub worker: Option<PeerWorker>,
    pub subscription: Option<SubscriptionId>,
}

impl CallSession {
    #[must_use]
    pub fn new(generation: Generation, subscription: SubscriptionId) -> Self {
        Self {
            generation,
            state: CallState::Idle,
            local_stream: None,
            remote_stream: None,
            local_description: None,
            remote_description: None,
            remote_description_pending: false,
            pending_local_candidates: IceCandidateQueue::new(),
            pending_remote_candidates: IceCandidateQueue::new(),
            worker: None,
            subscription: Some(subscription),
        }
    }
}
