//! Frame composition
//!
//! Turns the element store into pixels on a `PanelDriver`.

pub mod idle;
pub mod pipeline;

pub use pipeline::{RenderOutcome, RenderPipeline};
