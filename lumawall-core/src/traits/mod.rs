//! Collaborator traits
//!
//! These traits define the interface between the display logic and the
//! things it does not own: image decoding, glyph rasterization and the
//! outbound link.

pub mod glyph;
pub mod image;

pub use glyph::{FontMetrics, Glyph, GlyphBitmap, GlyphSource};
pub use image::{FrameSequence, ImageFrame, ImageSource, SourceError};
pub use lumawall_protocol::LinkWriter;
