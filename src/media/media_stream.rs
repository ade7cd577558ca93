use std::fmt;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use rand::{RngCore, rngs::OsRng};

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// Backend resource kept alive while a track is live (an open camera, a mic stream).
pub trait CaptureHandle: Send {
    fn release(&mut self);
}

struct TrackInner {
    id: String,
    kind: TrackKind,
    label: String,
    live: AtomicBool,
    capture: Mutex<Option<Box<dyn CaptureHandle>>>,
}

/// Shared handle to one media track. Clones refer to the same track, so a
/// stop through any clone is visible through all of them.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    #[must_use]
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self::with_capture(kind, label, None)
    }

    #[must_use]
    pub fn with_capture(
        kind: TrackKind,
        label: impl Into<String>,
        capture: Option<Box<dyn CaptureHandle>>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: new_id(&kind.to_string()),
                kind,
                label: label.into(),
                live: AtomicBool::new(true),
                capture: Mutex::new(capture),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Stops the track and releases its capture resource.
    /// Returns `false` when it was already stopped.
    pub fn stop(&self) -> bool {
        if !self.inner.live.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Ok(mut guard) = self.inner.capture.lock()
            && let Some(mut capture) = guard.take()
        {
            capture.release();
        }
        true
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .field("live", &self.is_live())
            .finish()
    }
}

/// A group of tracks, local or remote.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    #[must_use]
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self::with_id(new_id("stream"), tracks)
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    #[must_use]
    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    /// True while at least one track is live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stops every track; returns how many were live.
    pub fn stop_all(&self) -> usize {
        self.tracks.iter().filter(|t| t.stop()).count()
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{:08x}", OsRng.next_u32())
}
