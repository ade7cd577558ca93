//! Real capture devices: camera through OpenCV, microphone through CPAL.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use opencv::{
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::{
    log::LogSink,
    media::{
        CaptureHandle, MediaAccessError, MediaConstraints, MediaSource, MediaStream, MediaTrack,
        TrackKind,
    },
    sink_debug,
};

/// Keeps the camera open until the video track is stopped.
struct CameraCapture {
    cam: Option<VideoCapture>,
}

impl CaptureHandle for CameraCapture {
    fn release(&mut self) {
        if let Some(mut cam) = self.cam.take() {
            let _ = cam.release();
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct DeviceMediaSource {
    logger: Arc<dyn LogSink>,
}

impl DeviceMediaSource {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self { logger }
    }

    fn open_camera(&self, device_id: usize) -> Result<MediaTrack, MediaAccessError> {
        let id = i32::try_from(device_id)
            .map_err(|_| MediaAccessError::NoDevice(format!("camera #{device_id}")))?;
        let cam = VideoCapture::new(id, videoio::CAP_ANY)?;
        if !cam.is_opened().unwrap_or(false) {
            return Err(MediaAccessError::NoDevice(format!("camera #{device_id}")));
        }

        let width = cam.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height = cam.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        sink_debug!(self.logger, "[MEDIA] camera #{device_id} opened {width}x{height}");

        Ok(MediaTrack::with_capture(
            TrackKind::Video,
            format!("camera #{device_id}"),
            Some(Box::new(CameraCapture { cam: Some(cam) })),
        ))
    }

    fn probe_microphone(&self) -> Result<MediaTrack, MediaAccessError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| MediaAccessError::NoDevice("microphone".into()))?;
        device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                MediaAccessError::DeviceBusy("microphone".into())
            }
            other => MediaAccessError::Backend(format!("CPAL: {other}")),
        })?;
        let label = device.name().unwrap_or_else(|_| "microphone".into());
        sink_debug!(self.logger, "[MEDIA] microphone available: {label}");
        Ok(MediaTrack::new(TrackKind::Audio, label))
    }
}

impl MediaSource for DeviceMediaSource {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaAccessError> {
        let mut tracks = Vec::with_capacity(2);
        if constraints.audio {
            tracks.push(self.probe_microphone()?);
        }
        if constraints.video {
            match self.open_camera(constraints.camera_device) {
                Ok(track) => tracks.push(track),
                Err(e) => {
                    // Do not leak the microphone track on a camera failure.
                    tracks.iter().for_each(|t| {
                        t.stop();
                    });
                    return Err(e);
                }
            }
        }
        Ok(MediaStream::new(tracks))
    }
}
