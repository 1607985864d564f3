//! Mute state module
//!
//! Tri-valued state of the monitored application:
//! - Unknown: startup, or right after a preferences reload
//! - Muted: microphone closed, or the probe gave no usable answer
//! - Unmuted: microphone live

mod machine;

pub use machine::{Debouncer, MuteState};
