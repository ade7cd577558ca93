//! The `app` module holds the `eframe` front end: a thin window over a
//! [`SessionStateMachine`](crate::call::SessionStateMachine).

pub mod call_app;
mod panels;

pub use call_app::CallApp;
