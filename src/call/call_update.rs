use crate::{
    call::{CallState, CallStatus},
    media::MediaStream,
};

/// Notifications delivered to observers registered with
/// [`SessionStateMachine::subscribe`](crate::call::SessionStateMachine::subscribe).
#[derive(Debug, Clone)]
pub enum CallUpdate {
    StateChanged { state: CallState, status: CallStatus },
    /// Human-readable failure; the session is already torn down.
    Error(String),
    LocalStream(Option<MediaStream>),
    RemoteStream(Option<MediaStream>),
}
