//! Panel abstraction for Lumawall
//!
//! This crate provides:
//! - `PanelDriver` trait implemented by whatever drives the physical wall
//! - `FrameBuffer` and `MemoryPanel`, a double-buffered in-memory panel used
//!   for headless runs and tests
//!
//! # Architecture
//!
//! The compositor in `lumawall-core` only ever talks to a `PanelDriver`. It
//! paints into the back buffer with `set_pixel` and makes the result visible
//! with `present`. Electrical and timing concerns of real HUB75 chains stay
//! behind the trait.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod framebuffer;

// Re-export key types
pub use backend::{PanelDriver, PanelError};
pub use framebuffer::{FrameBuffer, MemoryPanel};
pub use lumawall_protocol::Rgb;
