use std::fmt;

use crate::{media::MediaAccessError, peer::PeerError, signaling::SignalingError};

/// Everything that can go wrong while placing a call.
///
/// All variants except `AlreadyInCall` and `CandidateApply` end the session.
#[derive(Debug)]
pub enum CallError {
    MediaAccess(MediaAccessError),
    PeerCreation(PeerError),
    /// A local track could not be attached to the peer connection.
    TrackAttach(PeerError),
    OfferCreation(PeerError),
    DescriptionApply(PeerError),
    SignalingSend(SignalingError),
    IceNegotiationFailure,
    AlreadyInCall,
    CandidateApply(PeerError),
}

impl CallError {
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, CallError::AlreadyInCall | CallError::CandidateApply(_))
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::MediaAccess(e) => write!(f, "Could not access camera or microphone: {e}"),
            CallError::PeerCreation(e) => write!(f, "Could not create the peer connection: {e}"),
            CallError::TrackAttach(e) => {
                write!(f, "Could not attach local media to the call: {e}")
            }
            CallError::OfferCreation(e) => write!(f, "Could not create the call offer: {e}"),
            CallError::DescriptionApply(e) => write!(f, "Call negotiation failed: {e}"),
            CallError::SignalingSend(e) => write!(f, "Could not reach the other peer: {e}"),
            CallError::IceNegotiationFailure => {
                write!(f, "Connection to the other peer failed")
            }
            CallError::AlreadyInCall => write!(f, "A call is already in progress"),
            CallError::CandidateApply(e) => write!(f, "Ignored a remote candidate: {e}"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::MediaAccess(e) => Some(e),
            CallError::PeerCreation(e)
            | CallError::TrackAttach(e)
            | CallError::OfferCreation(e)
            | CallError::DescriptionApply(e)
            | CallError::CandidateApply(e) => Some(e),
            CallError::SignalingSend(e) => Some(e),
            CallError::IceNegotiationFailure | CallError::AlreadyInCall => None,
        }
    }
}

impl From<MediaAccessError> for CallError {
    fn from(e: MediaAccessError) -> Self {
        CallError::MediaAccess(e)
    }
}

impl From<SignalingError> for CallError {
    fn from(e: SignalingError) -> Self {
        CallError::SignalingSend(e)
    }
}
