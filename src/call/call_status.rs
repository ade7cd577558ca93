use std::fmt;

use crate::call::CallState;

/// Coarse status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Idle,
    Connecting,
    Connected,
    Failed,
}

impl CallStatus {
    #[must_use]
    pub const fn from_state(state: CallState, has_error: bool) -> Self {
        match state {
            CallState::Idle if has_error => CallStatus::Failed,
            CallState::Idle => CallStatus::Idle,
            CallState::Connected => CallStatus::Connected,
            CallState::AcquiringMedia
            | CallState::Negotiating(_)
            | CallState::AwaitingAnswer => CallStatus::Connecting,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CallStatus::Idle => "idle",
            CallStatus::Connecting => "connecting",
            CallStatus::Connected => "connected",
            CallStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::NegotiationPhase;

    #[test]
    fn maps_every_state() {
        assert_eq!(CallStatus::from_state(CallState::Idle, false), CallStatus::Idle);
        assert_eq!(CallStatus::from_state(CallState::Idle, true), CallStatus::Failed);
        assert_eq!(
            CallStatus::from_state(
                CallState::Negotiating(NegotiationPhase::SettingLocalDescription),
                false
            ),
            CallStatus::Connecting
        );
        assert_eq!(
            CallStatus::from_state(CallState::Connected, false),
            CallStatus::Connected
        );
    }
}
