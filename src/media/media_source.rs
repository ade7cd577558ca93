use std::sync::Arc;

use crate::{
    log::LogSink,
    media::{MediaAccessError, MediaConstraints, MediaStream},
    sink_debug, sink_info, sink_warn,
};

/// A capture backend. `acquire` may block (device open, permission prompt);
/// callers run it off the UI thread.
pub trait MediaSource: Send + Sync {
    /// # Errors
    /// Returns a [`MediaAccessError`] when the requested devices are denied,
    /// missing, or busy.
    fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaAccessError>;
}

/// Front door to local capture: validates constraints, delegates to the
/// backend, and owns the release semantics.
#[derive(Clone)]
pub struct MediaSourceManager {
    source: Arc<dyn MediaSource>,
    logger: Arc<dyn LogSink>,
}

impl MediaSourceManager {
    pub fn new(source: Arc<dyn MediaSource>, logger: Arc<dyn LogSink>) -> Self {
        Self { source, logger }
    }

    /// Requests local capture.
    ///
    /// # Errors
    /// [`MediaAccessError::EmptyConstraints`] when nothing is requested, or
    /// whatever the backend reports.
    pub fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaAccessError> {
        if constraints.is_empty() {
            return Err(MediaAccessError::EmptyConstraints);
        }
        sink_debug!(
            self.logger,
            "[MEDIA] acquiring audio={} video={} camera={}",
            constraints.audio,
            constraints.video,
            constraints.camera_device
        );
        match self.source.acquire(constraints) {
            Ok(stream) => {
                sink_info!(
                    self.logger,
                    "[MEDIA] acquired {} with {} track(s)",
                    stream.id(),
                    stream.tracks().len()
                );
                Ok(stream)
            }
            Err(e) => {
                sink_warn!(self.logger, "[MEDIA] acquisition failed: {e}");
                Err(e)
            }
        }
    }

    /// Stops every track of `stream`. Safe on `None` and on streams that were
    /// already released.
    pub fn release(&self, stream: Option<&MediaStream>) {
        let Some(stream) = stream else {
            return;
        };
        let stopped = stream.stop_all();
        if stopped > 0 {
            sink_info!(self.logger, "[MEDIA] released {} ({stopped} track(s) stopped)", stream.id());
        }
    }
}
