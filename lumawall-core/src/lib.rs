//! Board-agnostic core logic for the Lumawall controller
//!
//! This crate contains all application logic that does not depend on a
//! particular panel, serial port or file system:
//!
//! - Collaborator traits (image source, glyph source, link writer)
//! - Link restart detection
//! - Command queue and retransmission filter
//! - Element store
//! - Animation scheduling
//! - Two-pass compositor with idle screen
//! - Command application and replies
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod dedup;
pub mod element;
pub mod font;
pub mod link;
pub mod palette;
pub mod queue;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod traits;

pub use controller::{Admission, Controller, FrameDisposition, Reply, ResponseEmitter};
pub use element::{DisplayElement, ElementContent, ElementId, ElementKind, Rect};
pub use font::BuiltinFont;
pub use link::{LinkEvent, LinkRecoveryMonitor};
pub use queue::CommandQueue;
pub use render::{RenderOutcome, RenderPipeline};
pub use scheduler::AnimationScheduler;
pub use store::{ElementStore, StoreError};
