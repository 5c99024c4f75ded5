//! In-memory framebuffers
//!
//! `MemoryPanel` keeps a back buffer for drawing and a front buffer holding
//! the last presented frame, mirroring how the LED matrix library swaps
//! buffers on vsync.

use alloc::vec;
use alloc::vec::Vec;

use lumawall_protocol::Rgb;

use crate::backend::{PanelDriver, PanelError};

/// Row-major RGB pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    /// Create a black buffer
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: u16, y: u16, color: Rgb) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.pixels[i] = color;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Count pixels that are not black
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != Rgb::BLACK).count()
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}

/// Double-buffered panel held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    back: FrameBuffer,
    front: FrameBuffer,
    presents: u32,
    pixel_writes: u64,
}

impl MemoryPanel {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            back: FrameBuffer::new(width, height),
            front: FrameBuffer::new(width, height),
            presents: 0,
            pixel_writes: 0,
        }
    }

    /// Pixel of the last presented frame
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        self.front.get(x, y)
    }

    /// Last presented frame
    pub fn front(&self) -> &FrameBuffer {
        &self.front
    }

    /// Number of frames presented so far
    pub fn presents(&self) -> u32 {
        self.presents
    }

    /// Total `set_pixel` calls, including ones never presented
    pub fn pixel_writes(&self) -> u64 {
        self.pixel_writes
    }
}

impl PanelDriver for MemoryPanel {
    fn clear(&mut self) -> Result<(), PanelError> {
        self.back.fill(Rgb::BLACK);
        Ok(())
    }

    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), PanelError> {
        self.pixel_writes += 1;
        if self.back.set(x, y, color) {
            Ok(())
        } else {
            Err(PanelError::InvalidCoordinates)
        }
    }

    fn present(&mut self) -> Result<(), PanelError> {
        core::mem::swap(&mut self.front, &mut self.back);
        self.back.clone_from(&self.front);
        self.presents += 1;
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        (self.back.width(), self.back.height())
    }
}
