use crate::media::{
    MediaAccessError, MediaConstraints, MediaSource, MediaStream, MediaTrack, TrackKind,
};

/// Capture backend without hardware: hands out live tracks labelled as test
/// sources. Used by the demo client when built without the `devices` feature.
#[derive(Debug, Default, Clone)]
pub struct SyntheticMediaSource;

impl MediaSource for SyntheticMediaSource {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaAccessError> {
        let mut tracks = Vec::with_capacity(2);
        if constraints.audio {
            tracks.push(MediaTrack::new(TrackKind::Audio, "synthetic tone"));
        }
        if constraints.video {
            tracks.push(MediaTrack::new(
                TrackKind::Video,
                format!("synthetic pattern #{}", constraints.camera_device),
            ));
        }
        Ok(MediaStream::new(tracks))
    }
}
