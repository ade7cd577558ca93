#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]
//! Fakes shared by the call scenario tests.

use std::{
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use rustycall::{
    call::{CallDependencies, SessionStateMachine},
    ice::CandidateRecord,
    log::{LogSink, MemoryLogSink},
    media::{
        MediaAccessError, MediaConstraints, MediaSource, MediaStream, MediaTrack, TrackKind,
    },
    peer::{
        PeerConfig, PeerConnectionAdapter, PeerConnectionFactory, PeerError, PeerEvent,
        PeerEventSink, SessionDescription,
    },
    signaling::InMemorySignalingChannel,
};

pub const WAIT: Duration = Duration::from_secs(3);

// ---------------------- MEDIA ----------------------

/// Media source whose `acquire` blocks until [`open`](Self::open) is called
/// (right away when built with [`immediate`](Self::immediate)).
pub struct GatedMediaSource {
    gate: Mutex<bool>,
    cv: Condvar,
    fail_with: Option<MediaAccessError>,
    handed_out: Mutex<Vec<MediaStream>>,
}

impl GatedMediaSource {
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Mutex::new(false),
            cv: Condvar::new(),
            fail_with: None,
            handed_out: Mutex::new(Vec::new()),
        })
    }

    pub fn immediate() -> Arc<Self> {
        let src = Self::gated();
        src.open();
        src
    }

    pub fn failing(err: MediaAccessError) -> Arc<Self> {
        Arc::new(Self {
            gate: Mutex::new(true),
            cv: Condvar::new(),
            fail_with: Some(err),
            handed_out: Mutex::new(Vec::new()),
        })
    }

    pub fn open(&self) {
        *self.gate.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn handed_out(&self) -> Vec<MediaStream> {
        self.handed_out.lock().unwrap().clone()
    }

    pub fn all_released(&self) -> bool {
        self.handed_out().iter().all(|s| !s.is_active())
    }
}

impl MediaSource for GatedMediaSource {
    fn acquire(&self, _c: &MediaConstraints) -> Result<MediaStream, MediaAccessError> {
        let mut open = self.gate.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
        drop(open);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let stream = MediaStream::new(vec![
            MediaTrack::new(TrackKind::Audio, "fake mic"),
            MediaTrack::new(TrackKind::Video, "fake cam"),
        ]);
        self.handed_out.lock().unwrap().push(stream.clone());
        Ok(stream)
    }
}

// ---------------------- ENGINE ----------------------

/// Holds every `add_track` call until [`open`](Self::open).
#[derive(Default)]
pub struct TrackGate {
    open: Mutex<bool>,
    cv: Condvar,
    entered: AtomicUsize,
}

impl TrackGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    /// Waits until some `add_track` call is parked on the gate.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.entered.load(Ordering::SeqCst) == 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }

    fn pass(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

/// Knobs for the recording engine.
#[derive(Default, Clone)]
pub struct EngineScript {
    /// Local candidates emitted while the offer is being created.
    pub candidates_during_offer: Vec<CandidateRecord>,
    pub fail_create_offer: bool,
    pub fail_add_track: bool,
    pub fail_remote_description: bool,
    pub reject_candidate: Option<String>,
    pub hold_add_track: Option<Arc<TrackGate>>,
}

/// Shared view of everything the engine was asked to do.
#[derive(Default)]
pub struct EngineProbe {
    journal: Mutex<Vec<String>>,
    sink: Mutex<Option<Arc<dyn PeerEventSink>>>,
    created: AtomicUsize,
}

impl EngineProbe {
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Raises an engine event as the most recently created adapter.
    pub fn emit(&self, event: PeerEvent) {
        let sink = self.sink.lock().unwrap().clone().expect("no adapter yet");
        sink.emit(event);
    }

    fn note(&self, line: impl Into<String>) {
        self.journal.lock().unwrap().push(line.into());
    }
}

pub struct RecordingFactory {
    probe: Arc<EngineProbe>,
    script: EngineScript,
}

impl RecordingFactory {
    pub fn new(script: EngineScript) -> (Arc<Self>, Arc<EngineProbe>) {
        let probe = Arc::new(EngineProbe::default());
        (
            Arc::new(Self {
                probe: Arc::clone(&probe),
                script,
            }),
            probe,
        )
    }
}

impl PeerConnectionFactory for RecordingFactory {
    fn create(
        &self,
        _config: &PeerConfig,
        events: Arc<dyn PeerEventSink>,
    ) -> Result<Box<dyn PeerConnectionAdapter>, PeerError> {
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        *self.probe.sink.lock().unwrap() = Some(Arc::clone(&events));
        Ok(Box::new(RecordingAdapter {
            probe: Arc::clone(&self.probe),
            script: self.script.clone(),
            events,
        }))
    }
}

struct RecordingAdapter {
    probe: Arc<EngineProbe>,
    script: EngineScript,
    events: Arc<dyn PeerEventSink>,
}

impl PeerConnectionAdapter for RecordingAdapter {
    fn create_offer(&mut self) -> Result<SessionDescription, PeerError> {
        self.probe.note("create_offer");
        if self.script.fail_create_offer {
            return Err(PeerError::Engine("no codecs".into()));
        }
        for c in &self.script.candidates_during_offer {
            self.events.emit(PeerEvent::IceCandidate(c.clone()));
        }
        Ok(SessionDescription::offer("O1"))
    }

    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError> {
        self.probe.note(format!("set_local {}", desc.sdp));
        Ok(())
    }

    fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<(), PeerError> {
        if self.script.fail_remote_description {
            return Err(PeerError::InvalidDescription("bad answer".into()));
        }
        self.probe.note(format!("set_remote {}", desc.sdp));
        Ok(())
    }

    fn add_ice_candidate(&mut self, candidate: &CandidateRecord) -> Result<(), PeerError> {
        if self.script.reject_candidate.as_deref() == Some(candidate.candidate.as_str()) {
            return Err(PeerError::InvalidCandidate(candidate.candidate.clone()));
        }
        self.probe.note(format!("add_candidate {}", candidate.candidate));
        Ok(())
    }

    fn add_track(&mut self, track: &MediaTrack, _stream: &MediaStream) -> Result<(), PeerError> {
        if let Some(gate) = &self.script.hold_add_track {
            gate.pass();
        }
        if self.script.fail_add_track {
            return Err(PeerError::Engine("track rejected".into()));
        }
        self.probe.note(format!("add_track {}", track.kind()));
        Ok(())
    }

    fn close(&mut self) {
        self.probe.note("close");
    }
}

// ---------------------- HARNESS ----------------------

pub struct Harness {
    pub machine: SessionStateMachine,
    pub media: Arc<GatedMediaSource>,
    pub engine: Arc<EngineProbe>,
    pub signaling: Arc<InMemorySignalingChannel>,
    pub log: Arc<MemoryLogSink>,
}

impl Harness {
    pub fn new(media: Arc<GatedMediaSource>, script: EngineScript) -> Self {
        let (factory, engine) = RecordingFactory::new(script);
        let signaling = Arc::new(InMemorySignalingChannel::new());
        let log = Arc::new(MemoryLogSink::new());
        let logger: Arc<dyn LogSink> = log.clone();
        let machine = SessionStateMachine::new(
            CallDependencies {
                media_source: media.clone(),
                peers: factory,
                signaling: signaling.clone(),
                logger,
            },
            PeerConfig::default(),
            MediaConstraints::audio_video(),
        );
        Self {
            machine,
            media,
            engine,
            signaling,
            log,
        }
    }

    pub fn ready() -> Self {
        Self::new(GatedMediaSource::immediate(), EngineScript::default())
    }

    /// Offers sent so far, as SDP strings.
    pub fn offers(&self) -> Vec<String> {
        self.signaling
            .sent()
            .into_iter()
            .filter_map(|m| match m {
                rustycall::signaling::SignalingMessage::Offer { sdp } => Some(sdp),
                _ => None,
            })
            .collect()
    }

    /// Polls until the engine journal satisfies `pred`. Some engine calls
    /// (`close`) post nothing back, so this sleeps instead of blocking on the
    /// machine's channel.
    pub fn wait_journal(&mut self, pred: impl Fn(&[String]) -> bool) -> bool {
        let deadline = Instant::now() + WAIT;
        loop {
            self.machine.poll();
            if pred(&self.engine.journal()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}
