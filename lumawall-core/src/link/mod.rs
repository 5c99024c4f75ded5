//! Link health
//!
//! Detects co-processor restarts from the volume of unsynchronized bytes
//! and gates input while the peer finishes booting.

pub mod monitor;

pub use monitor::{LinkEvent, LinkRecoveryMonitor, LinkStats};
