use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    thread,
};

use crate::{
    ice::CandidateRecord,
    log::LogSink,
    media::{MediaStream, MediaTrack},
    peer::{PeerConnectionAdapter, PeerError, SessionDescription},
    sink_debug, sink_trace,
};

/// Work queued for the adapter thread. Executed strictly in submission order.
#[derive(Debug)]
pub enum PeerCommand {
    AddTrack {
        track: MediaTrack,
        stream: MediaStream,
    },
    CreateOffer,
    SetLocalDescription(SessionDescription),
    SetRemoteDescription(SessionDescription),
    AddIceCandidate(CandidateRecord),
    Close,
}

/// Result of a finished [`PeerCommand`]. `Close` reports nothing.
#[derive(Debug, Clone)]
pub enum PeerOutcome {
    TrackAdded {
        track_id: String,
        result: Result<(), PeerError>,
    },
    OfferCreated(Result<SessionDescription, PeerError>),
    LocalDescriptionSet(Result<SessionDescription, PeerError>),
    RemoteDescriptionSet(Result<SessionDescription, PeerError>),
    CandidateApplied {
        candidate: CandidateRecord,
        result: Result<(), PeerError>,
    },
}

type OutcomeFn = Box<dyn Fn(PeerOutcome) + Send>;

/// Owns one adapter on a dedicated thread.
///
/// Dropping the worker (or calling [`close`](Self::close)) cancels every
/// command not yet started and closes the adapter as soon as the one in
/// progress, if any, returns. It never waits for the thread.
pub struct PeerWorker {
    tx: Option<Sender<PeerCommand>>,
    cancelled: Arc<AtomicBool>,
}

impl PeerWorker {
    /// # Errors
    /// [`PeerError::WorkerUnavailable`] if the thread cannot be spawned.
    pub fn spawn(
        adapter: Box<dyn PeerConnectionAdapter>,
        on_outcome: OutcomeFn,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, PeerError> {
        let (tx, rx) = mpsc::channel::<PeerCommand>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_seen = Arc::clone(&cancelled);
        thread::Builder::new()
            .name("peer-worker".into())
            .spawn(move || {
                let mut adapter = adapter;
                let mut closed = false;
                while let Ok(cmd) = rx.recv() {
                    if cancel_seen.load(Ordering::Acquire) {
                        sink_debug!(logger, "[PEER] cancelled, dropping {cmd:?}");
                        break;
                    }
                    sink_trace!(logger, "[PEER] executing {cmd:?}");
                    let outcome = execute(adapter.as_mut(), cmd, &mut closed);
                    if let Some(outcome) = outcome
                        && !cancel_seen.load(Ordering::Acquire)
                    {
                        on_outcome(outcome);
                    }
                    if closed {
                        break;
                    }
                }
                if !closed {
                    adapter.close();
                }
                sink_debug!(logger, "[PEER] worker finished");
            })
            .map_err(|_| PeerError::WorkerUnavailable)?;
        Ok(Self {
            tx: Some(tx),
            cancelled,
        })
    }

    /// # Errors
    /// [`PeerError::WorkerUnavailable`] once the worker has stopped.
    pub fn submit(&self, cmd: PeerCommand) -> Result<(), PeerError> {
        self.tx
            .as_ref()
            .ok_or(PeerError::WorkerUnavailable)?
            .send(cmd)
            .map_err(|_| PeerError::WorkerUnavailable)
    }

    /// Cancels queued work and asks the thread to close the adapter.
    pub fn close(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(PeerCommand::Close);
        }
    }
}

impl Drop for PeerWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn execute(
    adapter: &mut dyn PeerConnectionAdapter,
    cmd: PeerCommand,
    closed: &mut bool,
) -> Option<PeerOutcome> {
    let outcome = match cmd {
        PeerCommand::AddTrack { track, stream } => PeerOutcome::TrackAdded {
            track_id: track.id().to_owned(),
            result: adapter.add_track(&track, &stream),
        },
        PeerCommand::CreateOffer => PeerOutcome::OfferCreated(adapter.create_offer()),
        PeerCommand::SetLocalDescription(desc) => {
            PeerOutcome::LocalDescriptionSet(adapter.set_local_description(&desc).map(|()| desc))
        }
        PeerCommand::SetRemoteDescription(desc) => {
            PeerOutcome::RemoteDescriptionSet(adapter.set_remote_description(&desc).map(|()| desc))
        }
        PeerCommand::AddIceCandidate(candidate) => {
            let result = adapter.add_ice_candidate(&candidate);
            PeerOutcome::CandidateApplied { candidate, result }
        }
        PeerCommand::Close => {
            adapter.close();
            *closed = true;
            return None;
        }
    };
    Some(outcome)
}
