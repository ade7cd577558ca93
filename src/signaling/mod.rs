//! Client side of the signaling exchange: the message envelope, the channel
//! contract the call state machine consumes, and concrete channels.
pub mod channel;
pub mod loopback;
pub mod memory;
pub mod message;
pub mod signaling_error;
pub mod tcp;

pub use channel::{HandlerRegistry, MessageHandler, SignalingChannel, SubscriptionId};
pub use loopback::LoopbackSignalingChannel;
pub use memory::InMemorySignalingChannel;
pub use message::SignalingMessage;
pub use signaling_error::SignalingError;
pub use tcp::TcpSignalingChannel;
