use std::fmt;

use crate::{ice::CandidateRecord, media::MediaStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for PeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PeerConnectionState::New => "new",
            PeerConnectionState::Connecting => "connecting",
            PeerConnectionState::Connected => "connected",
            PeerConnectionState::Disconnected => "disconnected",
            PeerConnectionState::Failed => "failed",
            PeerConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Notifications raised by the engine, possibly from its own threads.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A local candidate was discovered.
    IceCandidate(CandidateRecord),
    /// The remote side started sending media.
    Track(MediaStream),
    ConnectionStateChanged(PeerConnectionState),
}

pub trait PeerEventSink: Send + Sync {
    fn emit(&self, event: PeerEvent);
}

impl<F> PeerEventSink for F
where
    F: Fn(PeerEvent) + Send + Sync,
{
    fn emit(&self, event: PeerEvent) {
        self(event);
    }
}
