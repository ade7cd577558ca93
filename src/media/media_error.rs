use std::fmt;

/// Why local capture could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAccessError {
    PermissionDenied(String),
    NoDevice(String),
    DeviceBusy(String),
    /// Constraints requested neither audio nor video.
    EmptyConstraints,
    Backend(String),
}

impl fmt::Display for MediaAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MediaAccessError::*;
        match self {
            PermissionDenied(what) => write!(f, "Permission to access {what} was denied"),
            NoDevice(what) => write!(f, "No {what} device found"),
            DeviceBusy(what) => write!(f, "The {what} device is busy"),
            EmptyConstraints => write!(f, "Neither audio nor video was requested"),
            Backend(e) => write!(f, "Capture backend error: {e}"),
        }
    }
}

impl std::error::Error for MediaAccessError {}

#[cfg(feature = "devices")]
impl From<opencv::Error> for MediaAccessError {
    fn from(err: opencv::Error) -> Self {
        MediaAccessError::Backend(format!("OpenCV: {err}"))
    }
}
