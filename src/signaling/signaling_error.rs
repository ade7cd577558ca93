use std::{fmt, io};

/// Failures surfaced by a signaling channel.
#[derive(Debug)]
pub enum SignalingError {
    /// The transport refused the message.
    Rejected(String),
    /// The channel is no longer connected.
    Disconnected,
    Io(io::Error),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl fmt::Display for SignalingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(why) => write!(f, "signaling transport rejected message: {why}"),
            Self::Disconnected => write!(f, "signaling channel disconnected"),
            Self::Io(e) => write!(f, "signaling IO error: {e}"),
            Self::Encode(e) => write!(f, "could not encode signaling message: {e}"),
            Self::Decode(e) => write!(f, "could not decode signaling message: {e}"),
        }
    }
}

impl std::error::Error for SignalingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) | Self::Decode(e) => Some(e),
            Self::Rejected(_) | Self::Disconnected => None,
        }
    }
}

impl From<io::Error> for SignalingError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
