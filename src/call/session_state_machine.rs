use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    call::{
        CallError, CallEvent, CallSession, CallState, CallStatus, CallUpdate, Generation,
        NegotiationPhase,
    },
    ice::CandidateRecord,
    log::LogSink,
    media::{MediaAccessError, MediaConstraints, MediaSource, MediaSourceManager, MediaStream},
    peer::{
        PeerCommand, PeerConfig, PeerConnectionFactory, PeerConnectionState, PeerError, PeerEvent,
        PeerEventSink, PeerOutcome, PeerWorker, SessionDescription,
    },
    signaling::{SignalingChannel, SignalingMessage},
    sink_debug, sink_error, sink_info, sink_trace, sink_warn,
};

/// Collaborators injected into the machine.
pub struct CallDependencies {
    pub media_source: Arc<dyn MediaSource>,
    pub peers: Arc<dyn PeerConnectionFactory>,
    pub signaling: Arc<dyn SignalingChannel>,
    pub logger: Arc<dyn LogSink>,
}

struct ReportedError {
    error: CallError,
    message: String,
}

/// Owns the single active call and advances it as events arrive.
///
/// Nothing here blocks: media capture and every engine call run on worker
/// threads, and their completions come back through an internal channel
/// drained by [`poll`](Self::poll) or [`run_until`](Self::run_until).
pub struct SessionStateMachine {
    media: MediaSourceManager,
    peers: Arc<dyn PeerConnectionFactory>,
    signaling: Arc<dyn SignalingChannel>,
    logger: Arc<dyn LogSink>,
    peer_config: PeerConfig,
    constraints: MediaConstraints,

    session: Option<CallSession>,
    last_generation: Generation,
    last_error: Option<ReportedError>,

    event_tx: Sender<CallEvent>,
    event_rx: Receiver<CallEvent>,
    observers: Vec<Sender<CallUpdate>>,
}

impl SessionStateMachine {
    pub fn new(deps: CallDependencies, peer_config: PeerConfig, constraints: MediaConstraints) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            media: MediaSourceManager::new(deps.media_source, Arc::clone(&deps.logger)),
            peers: deps.peers,
            signaling: deps.signaling,
            logger: deps.logger,
            peer_config,
            constraints,
            session: None,
            last_generation: 0,
            last_error: None,
            event_tx,
            event_rx,
            observers: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Observable surface
    // ------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> CallState {
        self.session.as_ref().map_or(CallState::Idle, |s| s.state)
    }

    #[must_use]
    pub fn status(&self) -> CallStatus {
        CallStatus::from_state(self.state(), self.last_error.is_some())
    }

    /// Message of the failure that ended the last call, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|r| r.message.as_str())
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&CallError> {
        self.last_error.as_ref().map(|r| &r.error)
    }

    #[must_use]
    pub fn local_stream(&self) -> Option<&MediaStream> {
        self.session.as_ref().and_then(|s| s.local_stream.as_ref())
    }

    #[must_use]
    pub fn remote_stream(&self) -> Option<&MediaStream> {
        self.session.as_ref().and_then(|s| s.remote_stream.as_ref())
    }

    #[must_use]
    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.session.as_ref().and_then(|s| s.local_description.as_ref())
    }

    #[must_use]
    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.session.as_ref().and_then(|s| s.remote_description.as_ref())
    }

    /// Generation of the active session, if any.
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        self.session.as_ref().map(|s| s.generation)
    }

    /// Registers an observer. Disconnected observers are pruned on the next update.
    pub fn subscribe(&mut self) -> Receiver<CallUpdate> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Starts a new call attempt.
    ///
    /// Only rejects when a call is already active; later failures are
    /// reported through [`error`](Self::error) and observers.
    ///
    /// # Errors
    /// [`CallError::AlreadyInCall`] when not idle. Nothing is changed.
    pub fn start_call(&mut self) -> Result<(), CallError> {
        if self.session.is_some() {
            sink_warn!(self.logger, "[CALL] start_call ignored: already in {}", self.state());
            return Err(CallError::AlreadyInCall);
        }

        self.last_error = None;
        self.last_generation += 1;
        let generation = self.last_generation;

        let tx = self.event_tx.clone();
        let subscription = self.signaling.on_message(Box::new(move |msg| {
            let _ = tx.send(CallEvent::Signal { generation, msg });
        }));
        self.session = Some(CallSession::new(generation, subscription));
        sink_info!(self.logger, "[CALL] starting call (generation {generation})");
        self.transition(CallState::AcquiringMedia);

        let media = self.media.clone();
        let constraints = self.constraints;
        let tx = self.event_tx.clone();
        let spawned = thread::Builder::new()
            .name("media-acquire".into())
            .spawn(move || {
                let result = media.acquire(&constraints);
                let _ = tx.send(CallEvent::MediaAcquired { generation, result });
            });
        if let Err(e) = spawned {
            self.fail(CallError::MediaAccess(MediaAccessError::Backend(e.to_string())));
        }
        Ok(())
    }

    /// Ends the current call from any state. Safe to call repeatedly.
    pub fn end_call(&mut self) {
        let had_error = self.last_error.take().is_some();
        let was_active = self.teardown();
        if was_active {
            sink_info!(self.logger, "[CALL] call ended");
        } else {
            sink_debug!(self.logger, "[CALL] end_call while idle");
        }
        if was_active || had_error {
            self.notify_state();
        }
    }

    // ------------------------------------------------------------------
    // Event pump
    // ------------------------------------------------------------------

    /// Handles every queued event without blocking. Returns how many were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Handles events as they arrive until `done` holds or `timeout` elapses.
    /// Returns whether `done` held.
    pub fn run_until<F>(&mut self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if done(self) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.event_rx.recv_timeout(remaining) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return done(self);
                }
            }
        }
    }

    fn handle(&mut self, event: CallEvent) {
        let generation = event.generation();
        if !self.is_current(generation) {
            self.discard_stale(event);
            return;
        }
        match event {
            CallEvent::MediaAcquired { result, .. } => self.on_media_acquired(result),
            CallEvent::Signal { msg, .. } => self.on_signal(msg),
            CallEvent::Peer { event, .. } => self.on_peer_event(event),
            CallEvent::PeerDone { outcome, .. } => self.on_peer_outcome(outcome),
        }
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    fn discard_stale(&self, event: CallEvent) {
        match event {
            CallEvent::MediaAcquired {
                generation,
                result: Ok(stream),
            } => {
                sink_info!(
                    self.logger,
                    "[CALL] media for ended session {generation} arrived late; releasing"
                );
                self.media.release(Some(&stream));
            }
            other => {
                sink_trace!(self.logger, "[CALL] dropping stale event {other:?}");
            }
        }
    }

    // ------------------------------------------------------------------
    // Media
    // ------------------------------------------------------------------

    fn on_media_acquired(&mut self, result: Result<MediaStream, MediaAccessError>) {
        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(CallError::MediaAccess(e));
                return;
            }
        };
        if self.state() != CallState::AcquiringMedia {
            sink_warn!(self.logger, "[CALL] unexpected media in {}; releasing", self.state());
            self.media.release(Some(&stream));
            return;
        }
        let Some(generation) = self.generation() else {
            return;
        };

        if let Some(session) = self.session.as_mut() {
            session.local_stream = Some(stream.clone());
        }
        self.notify(&CallUpdate::LocalStream(Some(stream.clone())));
        self.transition(CallState::Negotiating(NegotiationPhase::Offering));

        let worker = match self.spawn_worker(generation) {
            Ok(worker) => worker,
            Err(e) => {
                self.fail(CallError::PeerCreation(e));
                return;
            }
        };

        let mut commands: Vec<PeerCommand> = stream
            .tracks()
            .iter()
            .map(|track| PeerCommand::AddTrack {
                track: track.clone(),
                stream: stream.clone(),
            })
            .collect();
        commands.push(PeerCommand::CreateOffer);
        let submitted = commands.into_iter().try_for_each(|cmd| worker.submit(cmd));

        if let Some(session) = self.session.as_mut() {
            session.worker = Some(worker);
        }
        if let Err(e) = submitted {
            self.fail(CallError::PeerCreation(e));
        }
    }

    fn spawn_worker(&self, generation: Generation) -> Result<PeerWorker, PeerError> {
        let tx = self.event_tx.clone();
        let sink: Arc<dyn PeerEventSink> = Arc::new(move |event: PeerEvent| {
            let _ = tx.send(CallEvent::Peer { generation, event });
        });
        let adapter = self.peers.create(&self.peer_config, sink)?;

        let tx = self.event_tx.clone();
        PeerWorker::spawn(
            adapter,
            Box::new(move |outcome| {
                let _ = tx.send(CallEvent::PeerDone {
                    generation,
                    outcome,
                });
            }),
            Arc::clone(&self.logger),
        )
    }

    // ------------------------------------------------------------------
    // Engine
    // ------------------------------------------------------------------

    fn on_peer_outcome(&mut self, outcome: PeerOutcome) {
        match outcome {
            PeerOutcome::TrackAdded { track_id, result } => match result {
                Ok(()) => sink_debug!(self.logger, "[CALL] track {track_id} attached"),
                Err(e) => self.fail(CallError::TrackAttach(e)),
            },
            PeerOutcome::OfferCreated(result) => self.on_offer_created(result),
            PeerOutcome::LocalDescriptionSet(result) => self.on_local_description_set(result),
            PeerOutcome::RemoteDescriptionSet(result) => self.on_remote_description_set(result),
            PeerOutcome::CandidateApplied { candidate, result } => match result {
                Ok(()) => sink_trace!(self.logger, "[CALL] applied remote {candidate}"),
                Err(e) => {
                    let err = CallError::CandidateApply(e);
                    sink_warn!(self.logger, "[CALL] {err} ({candidate})");
                }
            },
        }
    }

    fn on_offer_created(&mut self, result: Result<SessionDescription, PeerError>) {
        let offer = match result {
            Ok(offer) => offer,
            Err(e) => {
                self.fail(CallError::OfferCreation(e));
                return;
            }
        };
        if !self.transition(CallState::Negotiating(NegotiationPhase::SettingLocalDescription)) {
            return;
        }
        if let Err(e) = self.submit(PeerCommand::SetLocalDescription(offer)) {
            self.fail(CallError::DescriptionApply(e));
        }
    }

    fn on_local_description_set(&mut self, result: Result<SessionDescription, PeerError>) {
        let offer = match result {
            Ok(offer) => offer,
            Err(e) => {
                self.fail(CallError::DescriptionApply(e));
                return;
            }
        };
        if self.state() != CallState::Negotiating(NegotiationPhase::SettingLocalDescription) {
            sink_warn!(self.logger, "[CALL] local description applied in {}", self.state());
            return;
        }

        if let Err(e) = self.signaling.send(&SignalingMessage::offer(offer.sdp.clone())) {
            self.fail(CallError::SignalingSend(e));
            return;
        }
        sink_info!(self.logger, "[CALL] offer sent");

        let backlog = match self.session.as_mut() {
            Some(session) => {
                session.local_description = Some(offer);
                session.pending_local_candidates.mark_ready()
            }
            None => return,
        };
        for candidate in backlog {
            self.send_local_candidate(candidate);
        }
        self.transition(CallState::AwaitingAnswer);
    }

    fn on_remote_description_set(&mut self, result: Result<SessionDescription, PeerError>) {
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                self.fail(CallError::DescriptionApply(e));
                return;
            }
        };
        let backlog = match self.session.as_mut() {
            Some(session) => {
                session.remote_description_pending = false;
                session.remote_description = Some(answer);
                session.pending_remote_candidates.mark_ready()
            }
            None => return,
        };
        sink_info!(
            self.logger,
            "[CALL] remote description applied; {} queued candidate(s) follow",
            backlog.len()
        );
        for candidate in backlog {
            self.apply_remote_candidate(candidate);
        }
    }

    fn on_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::IceCandidate(candidate) => {
                let ready = self
                    .session
                    .as_mut()
                    .and_then(|s| s.pending_local_candidates.offer(candidate));
                if let Some(candidate) = ready {
                    self.send_local_candidate(candidate);
                }
            }
            PeerEvent::Track(stream) => {
                sink_info!(
                    self.logger,
                    "[CALL] remote stream {} ({} track(s))",
                    stream.id(),
                    stream.tracks().len()
                );
                if let Some(session) = self.session.as_mut() {
                    session.remote_stream = Some(stream.clone());
                }
                self.notify(&CallUpdate::RemoteStream(Some(stream)));
            }
            PeerEvent::ConnectionStateChanged(PeerConnectionState::Connected) => {
                if self.state() == CallState::AwaitingAnswer {
                    self.transition(CallState::Connected);
                } else {
                    sink_debug!(self.logger, "[CALL] transport connected while {}", self.state());
                }
            }
            PeerEvent::ConnectionStateChanged(PeerConnectionState::Failed) => {
                self.fail(CallError::IceNegotiationFailure);
            }
            PeerEvent::ConnectionStateChanged(other) => {
                sink_debug!(self.logger, "[CALL] transport state {other}");
            }
        }
    }

    fn submit(&self, cmd: PeerCommand) -> Result<(), PeerError> {
        self.session
            .as_ref()
            .and_then(|s| s.worker.as_ref())
            .ok_or(PeerError::WorkerUnavailable)?
            .submit(cmd)
    }

    // ------------------------------------------------------------------
    // Signaling
    // ------------------------------------------------------------------

    fn on_signal(&mut self, msg: SignalingMessage) {
        match msg {
            SignalingMessage::Answer { sdp } => self.on_answer(sdp),
            SignalingMessage::Candidate { candidate } => {
                let ready = self
                    .session
                    .as_mut()
                    .and_then(|s| s.pending_remote_candidates.offer(candidate));
                if let Some(candidate) = ready {
                    self.apply_remote_candidate(candidate);
                }
            }
            SignalingMessage::Offer { .. } => {
                sink_warn!(self.logger, "[CALL] ignoring inbound offer; this client only calls out");
            }
        }
    }

    fn on_answer(&mut self, sdp: String) {
        let expecting = self.session.as_ref().is_some_and(|s| {
            s.state == CallState::AwaitingAnswer
                && s.remote_description.is_none()
                && !s.remote_description_pending
        });
        if !expecting {
            sink_warn!(self.logger, "[CALL] ignoring answer in {}", self.state());
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.remote_description_pending = true;
        }
        sink_info!(self.logger, "[CALL] answer received");
        if let Err(e) = self.submit(PeerCommand::SetRemoteDescription(SessionDescription::answer(sdp))) {
            self.fail(CallError::DescriptionApply(e));
        }
    }

    fn send_local_candidate(&self, candidate: CandidateRecord) {
        if let Err(e) = self.signaling.send(&SignalingMessage::candidate(candidate)) {
            sink_warn!(self.logger, "[CALL] could not send local candidate: {e}");
        }
    }

    fn apply_remote_candidate(&self, candidate: CandidateRecord) {
        if let Err(e) = self.submit(PeerCommand::AddIceCandidate(candidate)) {
            sink_warn!(self.logger, "[CALL] {}", CallError::CandidateApply(e));
        }
    }

    // ------------------------------------------------------------------
    // Transitions and teardown
    // ------------------------------------------------------------------

    fn transition(&mut self, next: CallState) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let prev = session.state;
        if !prev.can_transition_to(next) {
            sink_error!(self.logger, "[CALL] refusing transition {prev} -> {next}");
            return false;
        }
        session.state = next;
        sink_debug!(self.logger, "[CALL] {prev} -> {next}");
        self.notify_state();
        true
    }

    /// Releases every session resource and drops the session. Returns false
    /// when already idle.
    fn teardown(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        self.media.release(session.local_stream.as_ref());
        if let Some(mut worker) = session.worker.take() {
            worker.close();
        }
        if let Some(id) = session.subscription.take() {
            self.signaling.unsubscribe(id);
        }
        session.pending_local_candidates.clear();
        session.pending_remote_candidates.clear();

        if session.local_stream.is_some() {
            self.notify(&CallUpdate::LocalStream(None));
        }
        if session.remote_stream.is_some() {
            self.notify(&CallUpdate::RemoteStream(None));
        }
        true
    }

    fn fail(&mut self, error: CallError) {
        let message = error.to_string();
        sink_error!(self.logger, "[CALL] {message} (in {})", self.state());
        self.teardown();
        self.last_error = Some(ReportedError { error, message: message.clone() });
        self.notify(&CallUpdate::Error(message));
        self.notify_state();
    }

    fn notify_state(&mut self) {
        let update = CallUpdate::StateChanged {
            state: self.state(),
            status: self.status(),
        };
        self.notify(&update);
    }

    fn notify(&mut self, update: &CallUpdate) {
        self.observers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

impl Drop for SessionStateMachine {
    fn drop(&mut self) {
        self.teardown();
    }
}
