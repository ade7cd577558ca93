//! Seam between the call state machine and the transport-negotiation engine.
pub mod adapter;
pub mod loopback;
pub mod peer_config;
pub mod peer_error;
pub mod peer_event;
pub mod peer_worker;
pub mod sdp_builder;
pub mod session_description;

pub use adapter::{PeerConnectionAdapter, PeerConnectionFactory};
pub use loopback::{LoopbackPeerConnection, LoopbackPeerFactory};
pub use peer_config::{IceServer, PeerConfig};
pub use peer_error::PeerError;
pub use peer_event::{PeerConnectionState, PeerEvent, PeerEventSink};
pub use peer_worker::{PeerCommand, PeerOutcome, PeerWorker};
pub use sdp_builder::{IceCredentials, build_session_description, media_section_count};
pub use session_description::{SdpKind, SessionDescription};
