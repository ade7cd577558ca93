use std::fmt;

use crate::ice::CandidateParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    /// The operation is not valid in the engine's current state.
    InvalidState(&'static str),
    /// A session description was rejected.
    InvalidDescription(String),
    /// A remote candidate could not be parsed or applied.
    InvalidCandidate(String),
    /// The connection was already closed.
    Closed,
    /// The worker thread is gone or could not be started.
    WorkerUnavailable,
    Engine(String),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerError::InvalidState(what) => write!(f, "invalid peer state: {what}"),
            PeerError::InvalidDescription(why) => write!(f, "invalid session description: {why}"),
            PeerError::InvalidCandidate(why) => write!(f, "invalid ICE candidate: {why}"),
            PeerError::Closed => write!(f, "peer connection closed"),
            PeerError::WorkerUnavailable => write!(f, "peer worker unavailable"),
            PeerError::Engine(why) => write!(f, "peer engine error: {why}"),
        }
    }
}

impl std::error::Error for PeerError {}

impl From<CandidateParseError> for PeerError {
    fn from(e: CandidateParseError) -> Self {
        PeerError::InvalidCandidate(e.to_string())
    }
}
