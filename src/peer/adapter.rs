use std::sync::Arc;

use crate::{
    ice::CandidateRecord,
    media::{MediaStream, MediaTrack},
    peer::{PeerConfig, PeerError, PeerEventSink, SessionDescription},
};

/// Operations the state machine needs from a transport-negotiation engine.
///
/// Calls may block; they are only ever issued from a
/// [`PeerWorker`](crate::peer::PeerWorker) thread, one at a time, in order.
pub trait PeerConnectionAdapter: Send {
    /// # Errors
    /// Engine-specific failure to produce an offer.
    fn create_offer(&mut self) -> Result<SessionDescription, PeerError>;

    /// # Errors
    /// The description was rejected.
    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError>;

    /// # Errors
    /// The description was rejected.
    fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError>;

    /// # Errors
    /// The candidate could not be parsed or is not acceptable yet.
    fn add_ice_candidate(&mut self, candidate: &CandidateRecord) -> Result<(), PeerError>;

    /// # Errors
    /// The track could not be attached.
    fn add_track(&mut self, track: &MediaTrack, stream: &MediaStream) -> Result<(), PeerError>;

    /// Releases engine resources. Further calls fail with [`PeerError::Closed`].
    fn close(&mut self);
}

pub trait PeerConnectionFactory: Send + Sync {
    /// # Errors
    /// The engine could not be constructed.
    fn create(
        &self,
        config: &PeerConfig,
        events: Arc<dyn PeerEventSink>,
    ) -> Result<Box<dyn PeerConnectionAdapter>, PeerError>;
}
