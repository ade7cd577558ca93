use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    /// Waiting for the engine to produce an offer.
    Offering,
    /// Offer produced; waiting for it to be applied locally.
    SettingLocalDescription,
}

/// Lifecycle of a call attempt.
///
/// ```text
/// Idle -> AcquiringMedia -> Negotiating(Offering) -> Negotiating(SettingLocalDescription)
///      -> AwaitingAnswer -> Connected
/// ```
/// Any state may drop back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallState {
    #[default]
    Idle,
    AcquiringMedia,
    Negotiating(NegotiationPhase),
    AwaitingAnswer,
    Connected,
}

impl CallState {
    const fn rank(self) -> u8 {
        match self {
            CallState::Idle => 0,
            CallState::AcquiringMedia => 1,
            CallState::Negotiating(NegotiationPhase::Offering) => 2,
            CallState::Negotiating(NegotiationPhase::SettingLocalDescription) => 3,
            CallState::AwaitingAnswer => 4,
            CallState::Connected => 5,
        }
    }

    /// Forward edges advance exactly one step; teardown to `Idle` is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: CallState) -> bool {
        matches!(next, CallState::Idle) || next.rank() == self.rank() + 1
    }

    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, CallState::Idle)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => f.write_str("idle"),
            CallState::AcquiringMedia => f.write_str("acquiring-media"),
            CallState::Negotiating(NegotiationPhase::Offering) => f.write_str("negotiating/offering"),
            CallState::Negotiating(NegotiationPhase::SettingLocalDescription) => {
                f.write_str("negotiating/setting-local-description")
            }
            CallState::AwaitingAnswer => f.write_str("awaiting-answer"),
            CallState::Connected => f.write_str("connected"),
        }
    }
}
