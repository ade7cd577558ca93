//! RustyCall places a one-to-one audio/video call from a local client.
//!
//! The crate is built around [`call::SessionStateMachine`], which owns a single
//! call attempt and drives it through media capture, offer/answer negotiation
//! and candidate exchange. Everything it talks to sits behind a trait so the
//! machine can run against real devices and a TCP relay, or entirely in
//! process.

/// `eframe` window with Start/End call controls.
pub mod app;
/// Call lifecycle, errors and the state machine.
pub mod call;
/// Wiring from configuration to a ready state machine.
pub mod client;
/// INI configuration and the typed call settings derived from it.
pub mod config;
/// Candidate records, the candidate line grammar, gathering and queues.
pub mod ice;
/// Logging utilities for the application.
pub mod log;
/// Local capture sources and streams.
pub mod media;
/// Engine adapter seam, worker thread and the loopback engine.
pub mod peer;
/// Signaling envelope and channels.
pub mod signaling;
