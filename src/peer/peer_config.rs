use std::fmt;

/// A STUN or TURN server URL, e.g. `stun:stun.l.google.com:19302`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    pub url: String,
}

impl IceServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn is_turn(&self) -> bool {
        self.url.starts_with("turn:") || self.url.starts_with("turns:")
    }
}

impl fmt::Display for IceServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Construction parameters handed to a [`PeerConnectionFactory`](crate::peer::PeerConnectionFactory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerConfig {
    pub ice_servers: Vec<IceServer>,
}
