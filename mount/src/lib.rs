//! Mount orchestration: attach a game-data image to the running VM.
//!
//! The primary path goes control plane first (add a block node, wire up a
//! virtio front-end), then tells the in-guest mount helper where to look.
//! Docker-backed services skip the control plane and only talk to the
//! helper. A watchdog loop runs alongside every attach sequence to prod a
//! stalled control plane on a second connection.

mod config;
mod directives;
mod error;
mod orchestrator;
mod serial;

pub use config::MountConfig;
pub use error::MountError;
pub use orchestrator::{MountOrchestrator, MountOutcome};
pub use serial::{content_serial, device_tag, identifier_serial};
