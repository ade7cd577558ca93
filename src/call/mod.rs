//! The call lifecycle: one session at a time, driven by user actions,
//! engine events and signaling messages.
pub mod call_error;
pub mod call_event;
pub mod call_session;
pub mod call_state;
pub mod call_status;
pub mod call_update;
pub mod session_state_machine;

pub use call_error::CallError;
pub use call_event::{CallEvent, Generation};
pub use call_session::CallSession;
pub use call_state::{CallState, NegotiationPhase};
pub use call_status::CallStatus;
pub use call_update::CallUpdate;
pub use session_state_machine::{CallDependencies, SessionStateMachine};
