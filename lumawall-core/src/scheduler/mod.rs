//! Animation scheduling
//!
//! Advances element animation state on the main-loop tick.

pub mod animation;

pub use animation::AnimationScheduler;
