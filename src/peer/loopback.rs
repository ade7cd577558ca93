use std::sync::Arc;

use crate::{
    ice::{CandidateRecord, gathering::gather_host_candidates},
    log::LogSink,
    media::{MediaStream, MediaTrack, TrackKind},
    peer::{
        IceCredentials, PeerConfig, PeerConnectionAdapter, PeerConnectionFactory,
        PeerConnectionState, PeerError, PeerEvent, PeerEventSink, SdpKind, SessionDescription,
        build_session_description, media_section_count,
    },
    sink_debug, sink_info,
};

/// Simulated engine. Builds real offers, gathers host candidates once the
/// local description is applied, and reports a remote track followed by
/// `Connected` after a remote description and one remote candidate.
pub struct LoopbackPeerConnection {
    events: Arc<dyn PeerEventSink>,
    logger: Arc<dyn LogSink>,
    creds: IceCredentials,
    include_loopback: bool,
    tracks: Vec<TrackKind>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    remote_candidates: usize,
    connected: bool,
    closed: bool,
}

impl LoopbackPeerConnection {
    pub fn new(
        config: &PeerConfig,
        events: Arc<dyn PeerEventSink>,
        logger: Arc<dyn LogSink>,
        include_loopback: bool,
    ) -> Self {
        for server in &config.ice_servers {
            sink_debug!(logger, "[PEER] configured ICE server {server}");
        }
        events.emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::New));
        Self {
            events,
            logger,
            creds: IceCredentials::generate(),
            include_loopback,
            tracks: Vec::new(),
            local: None,
            remote: None,
            remote_candidates: 0,
            connected: false,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), PeerError> {
        if self.closed {
            Err(PeerError::Closed)
        } else {
            Ok(())
        }
    }

    fn emit_local_candidates(&self) {
        for line in gather_host_candidates(self.include_loopback) {
            let record = line.to_record("0", 0);
            sink_debug!(self.logger, "[PEER] gathered {record}");
            self.events.emit(PeerEvent::IceCandidate(record));
        }
    }

    fn maybe_connect(&mut self) {
        if self.connected || self.remote.is_none() || self.remote_candidates == 0 {
            return;
        }
        self.connected = true;
        self.events
            .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Connecting));

        let kinds = if self.tracks.is_empty() {
            vec![TrackKind::Video]
        } else {
            self.tracks.clone()
        };
        let remote_tracks = kinds
            .into_iter()
            .map(|k| MediaTrack::new(k, format!("remote {k}")))
            .collect();
        self.events
            .emit(PeerEvent::Track(MediaStream::new(remote_tracks)));
        self.events
            .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Connected));
        sink_info!(self.logger, "[PEER] loopback transport connected");
    }
}

impl PeerConnectionAdapter for LoopbackPeerConnection {
    fn create_offer(&mut self) -> Result<SessionDescription, PeerError> {
        self.ensure_open()?;
        if self.local.is_some() {
            return Err(PeerError::InvalidState("offer already applied"));
        }
        Ok(SessionDescription::offer(build_session_description(
            SdpKind::Offer,
            &self.tracks,
            &self.creds,
        )))
    }

    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError> {
        self.ensure_open()?;
        if desc.kind != SdpKind::Offer {
            return Err(PeerError::InvalidDescription(format!(
                "expected local offer, got {}",
                desc.kind
            )));
        }
        if media_section_count(&desc.sdp) == 0 {
            return Err(PeerError::InvalidDescription("no media sections".into()));
        }
        self.local = Some(desc.clone());
        self.emit_local_candidates();
        Ok(())
    }

    fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError> {
        self.ensure_open()?;
        if self.local.is_none() {
            return Err(PeerError::InvalidState("remote description before local offer"));
        }
        if desc.kind != SdpKind::Answer {
            return Err(PeerError::InvalidDescription(format!(
                "expected remote answer, got {}",
                desc.kind
            )));
        }
        if desc.sdp.trim().is_empty() {
            return Err(PeerError::InvalidDescription("empty SDP".into()));
        }
        self.remote = Some(desc.clone());
        self.maybe_connect();
        Ok(())
    }

    fn add_ice_candidate(&mut self, candidate: &CandidateRecord) -> Result<(), PeerError> {
        self.ensure_open()?;
        if self.remote.is_none() {
            return Err(PeerError::InvalidState("candidate before remote description"));
        }
        let line = candidate.parse_line()?;
        sink_debug!(self.logger, "[PEER] remote candidate {}", line.address);
        self.remote_candidates += 1;
        self.maybe_connect();
        Ok(())
    }

    fn add_track(&mut self, track: &MediaTrack, stream: &MediaStream) -> Result<(), PeerError> {
        self.ensure_open()?;
        if self.local.is_some() {
            return Err(PeerError::InvalidState("renegotiation is not supported"));
        }
        sink_debug!(
            self.logger,
            "[PEER] attached {} track {} of {}",
            track.kind(),
            track.id(),
            stream.id()
        );
        self.tracks.push(track.kind());
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.events
            .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Closed));
        sink_debug!(self.logger, "[PEER] loopback connection closed");
    }
}

/// Builds [`LoopbackPeerConnection`]s.
pub struct LoopbackPeerFactory {
    logger: Arc<dyn LogSink>,
    include_loopback: bool,
}

impl LoopbackPeerFactory {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self {
            logger,
            include_loopback: true,
        }
    }

    /// Whether gathered candidates include 127.0.0.1.
    #[must_use]
    pub fn with_loopback_candidates(mut self, include: bool) -> Self {
        self.include_loopback = include;
        self
    }
}

impl PeerConnectionFactory for LoopbackPeerFactory {
    fn create(
        &self,
        config: &PeerConfig,
        events: Arc<dyn PeerEventSink>,
    ) -> Result<Box<dyn PeerConnectionAdapter>, PeerError> {
        Ok(Box::new(LoopbackPeerConnection::new(
            config,
            events,
            Arc::clone(&self.logger),
            self.include_loopback,
        )))
    }
}
