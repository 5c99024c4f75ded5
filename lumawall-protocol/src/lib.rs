//! Lumawall Serial Protocol
//!
//! This crate defines the byte-oriented protocol spoken between the
//! co-processor (sender) and the wall controller (receiver). The link is
//! assumed to be noisy: the co-processor may reboot mid-stream, and bytes
//! may be lost or duplicated.
//!
//! # Protocol Overview
//!
//! Every message uses the same binary frame:
//! ```text
//! ┌──────────┬───────┬───────────┬─────────┬─────────────┬────────────┬──────────┬─────┐
//! │ PREAMBLE │ START │ SCREEN_ID │ COMMAND │ PAYLOAD_LEN │ PAYLOAD    │ CHECKSUM │ END │
//! │ AA 55 AA │ 55    │ 1B        │ 1B      │ 1B          │ 0–255B     │ 1B       │ AA  │
//! └──────────┴───────┴───────────┴─────────┴─────────────┴────────────┴──────────┴─────┘
//! ```
//!
//! The checksum is the XOR of the payload bytes only. Multi-byte payload
//! fields are little-endian. Responses travel back over the same link using
//! the same framing with command code `0x80`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod codec;
pub mod color;
pub mod commands;
pub mod frame;
pub mod link;
pub mod peer;
pub mod response;
pub mod sync;

pub use color::Rgb;
pub use commands::{Command, DecodeError, GifCommand, GifLayout, TextCommand};
pub use frame::{validate, Frame, FrameError, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use link::LinkWriter;
pub use peer::{CommandSender, QueueFull};
pub use response::{Response, ResponseCode};
pub use sync::{FeedStatus, FrameSynchronizer, SyncEvent, SyncStats};
