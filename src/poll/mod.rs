//! Poll loop module
//!
//! Drives the probe on a fixed period and fans state changes out to the
//! indicators. Two logical phases:
//! - Idle: waiting for the next tick, a reload, or shutdown
//! - InFlight: one probe-and-dispatch cycle running to completion

mod poller;

pub use poller::PollLoop;
