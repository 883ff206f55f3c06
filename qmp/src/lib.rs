//! Minimal QMP-style control-plane client.
//!
//! One connection per attach sequence: connect, consume the greeting,
//! negotiate capabilities, send a handful of commands, close. Reconnecting
//! and retrying are the orchestrator's business, not this crate's.

mod client;
mod command;
mod error;

pub use client::{QmpClient, nudge};
pub use command::{BlockdevAddArgs, Command, DeviceAddArgs, FileBacking};
pub use error::QmpError;
