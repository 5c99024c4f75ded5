//! Screen controller
//!
//! Admits frames, applies commands to the element store and emits replies.

pub mod reply;
pub mod screen;

pub use reply::{Reply, ResponseEmitter, REPLY_DATA_LEN};
pub use screen::{Admission, Controller, FrameDisposition, DEFAULT_BRIGHTNESS};
