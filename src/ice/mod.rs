//! Connectivity candidates: the wire record, the `candidate:` line grammar,
//! host gathering, and the per-direction buffering queue.
pub mod candidate;
pub mod candidate_queue;
pub mod gathering;

pub use candidate::{CandidateLine, CandidateParseError, CandidateRecord, CandidateType};
pub use candidate_queue::IceCandidateQueue;
