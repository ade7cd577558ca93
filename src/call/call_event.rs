use crate::{
    media::{MediaAccessError, MediaStream},
    peer::{PeerEvent, PeerOutcome},
    signaling::SignalingMessage,
};

/// Session identity. Every asynchronous completion carries the generation it
/// was started under and is dropped if that session is gone.
pub type Generation = u64;

/// Inputs posted to the state machine from worker threads, the engine and
/// the signaling transport.
#[derive(Debug)]
pub enum CallEvent {
    MediaAcquired {
        generation: Generation,
        result: Result<MediaStream, MediaAccessError>,
    },
    Signal {
        generation: Generation,
        msg: SignalingMessage,
    },
    Peer {
        generation: Generation,
        event: PeerEvent,
    },
    PeerDone {
        generation: Generation,
        outcome: PeerOutcome,
    },
}

impl CallEvent {
    #[must_use]
    pub const fn generation(&self) -> Generation {
        match self {
            CallEvent::MediaAcquired { generation, .. }
            | CallEvent::Signal { generation, .. }
            | CallEvent::Peer { generation, .. }
            | CallEvent::PeerDone { generation, .. } => *generation,
        }
    }
}
