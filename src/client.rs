//! Assembles a [`SessionStateMachine`] from a [`CallConfig`].

use std::sync::Arc;

use crate::{
    call::{CallDependencies, SessionStateMachine},
    config::{CallConfig, SignalingMode},
    ice::gathering::gather_host_candidates,
    log::LogSink,
    media::{MediaSource, TrackKind},
    peer::{IceCredentials, LoopbackPeerFactory, SdpKind, build_session_description},
    signaling::{LoopbackSignalingChannel, SignalingChannel, SignalingError, TcpSignalingChannel},
    sink_info,
};

/// Capture backend for this build: real devices with the `devices` feature,
/// synthetic tracks otherwise.
#[must_use]
pub fn default_media_source(logger: &Arc<dyn LogSink>) -> Arc<dyn MediaSource> {
    #[cfg(feature = "devices")]
    {
        Arc::new(crate::media::device_source::DeviceMediaSource::new(Arc::clone(logger)))
    }
    #[cfg(not(feature = "devices"))]
    {
        let _ = logger;
        Arc::new(crate::media::SyntheticMediaSource)
    }
}

/// Opens the signaling channel selected by `cfg`.
///
/// In loopback mode the simulated remote answers with a description matching
/// the requested media and one loopback host candidate, so the call completes
/// on a single machine.
///
/// # Errors
/// [`SignalingError::Io`] when the TCP relay cannot be reached.
pub fn open_signaling(
    cfg: &CallConfig,
    logger: &Arc<dyn LogSink>,
) -> Result<Arc<dyn SignalingChannel>, SignalingError> {
    match &cfg.signaling {
        SignalingMode::Loopback { answer_delay } => {
            let mut kinds = Vec::new();
            if cfg.media.audio {
                kinds.push(TrackKind::Audio);
            }
            if cfg.media.video {
                kinds.push(TrackKind::Video);
            }
            let answer =
                build_session_description(SdpKind::Answer, &kinds, &IceCredentials::generate());
            let remote_candidates = gather_host_candidates(true)
                .into_iter()
                .filter(|c| c.address.ip().is_loopback())
                .map(|c| c.to_record("0", 0))
                .collect();
            Ok(Arc::new(
                LoopbackSignalingChannel::new(*answer_delay, Arc::clone(logger))
                    .with_answer_sdp(answer)
                    .with_remote_candidates(remote_candidates),
            ))
        }
        SignalingMode::Tcp { address } => Ok(Arc::new(TcpSignalingChannel::connect(
            address.as_str(),
            Arc::clone(logger),
        )?)),
    }
}

/// Builds the machine with the loopback engine and the configured signaling.
///
/// # Errors
/// See [`open_signaling`].
pub fn build_call_machine(
    cfg: &CallConfig,
    logger: Arc<dyn LogSink>,
) -> Result<SessionStateMachine, SignalingError> {
    let signaling = open_signaling(cfg, &logger)?;
    sink_info!(
        logger,
        "[CLIENT] signaling {} | {} ICE server(s)",
        cfg.signaling,
        cfg.peer.ice_servers.len()
    );
    let deps = CallDependencies {
        media_source: default_media_source(&logger),
        peers: Arc::new(LoopbackPeerFactory::new(Arc::clone(&logger))),
        signaling,
        logger,
    };
    Ok(SessionStateMachine::new(deps, cfg.peer.clone(), cfg.media))
}
