//! Image source trait
//!
//! Turns a file reference from a LoadGif command into decoded frames already
//! scaled to the element's size.

use alloc::vec;
use alloc::vec::Vec;

/// Errors resolving an image reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// No such file
    NotFound,
    /// Path escapes the image directory
    Forbidden,
    /// File exists but could not be read
    Unreadable,
    /// File contents are not a supported image
    Decode,
    /// Decoding produced no frames
    Empty,
}

impl core::fmt::Display for SourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SourceError::NotFound => write!(f, "image not found"),
            SourceError::Forbidden => write!(f, "image path not allowed"),
            SourceError::Unreadable => write!(f, "image unreadable"),
            SourceError::Decode => write!(f, "image could not be decoded"),
            SourceError::Empty => write!(f, "image has no frames"),
        }
    }
}

/// One decoded RGBA frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub width: u16,
    pub height: u16,
    /// Display time in milliseconds; 0 means "use the default"
    pub delay_ms: u32,
    /// Row-major RGBA pixels
    pub pixels: Vec<[u8; 4]>,
}

impl ImageFrame {
    /// Frame filled with a single RGBA colour
    pub fn solid(width: u16, height: u16, rgba: [u8; 4], delay_ms: u32) -> Self {
        Self {
            width,
            height,
            delay_ms,
            pixels: vec![rgba; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// A non-empty sequence of frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<ImageFrame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<ImageFrame>) -> Result<Self, SourceError> {
        if frames.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Never true for a sequence built with `new`
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, wrapping around the sequence
    pub fn frame(&self, index: usize) -> &ImageFrame {
        &self.frames[index % self.frames.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageFrame> {
        self.frames.iter()
    }
}

/// Image decoding/scaling collaborator
pub trait ImageSource {
    /// Resolve `path` and return its frames scaled to `width` x `height`
    fn decode_and_scale(&self, path: &str, width: u16, height: u16) -> Result<FrameSequence, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sequence_never_empty() {
        assert_eq!(FrameSequence::new(Vec::new()), Err(SourceError::Empty));

        let frames = FrameSequence::new(vec![
            ImageFrame::solid(2, 2, [255, 0, 0, 255], 0),
            ImageFrame::solid(2, 2, [0, 255, 0, 255], 40),
        ])
        .unwrap();
        assert!(!frames.is_empty());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames.frame(3).delay_ms, 40);
    }
}
