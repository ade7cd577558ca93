/// What the caller asks the capture backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
    /// Camera index handed to the device backend.
    pub camera_device: usize,
}

impl MediaConstraints {
    #[must_use]
    pub const fn audio_video() -> Self {
        Self {
            audio: true,
            video: true,
            camera_device: 0,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.audio && !self.video
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::audio_video()
    }
}
