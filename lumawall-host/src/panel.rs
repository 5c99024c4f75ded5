//! Headless panel
//!
//! Keeps the wall image in memory and, when configured, writes every
//! presented frame to a binary PPM file so the output can be inspected
//! without LED hardware attached.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use lumawall_display::{FrameBuffer, MemoryPanel, PanelDriver, PanelError};
use lumawall_protocol::Rgb;

/// In-memory panel with optional PPM snapshots
#[derive(Debug, Clone)]
pub struct HeadlessPanel {
    inner: MemoryPanel,
    snapshot: Option<PathBuf>,
}

impl HeadlessPanel {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            inner: MemoryPanel::new(width, height),
            snapshot: None,
        }
    }

    /// Write each presented frame to `path`
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Last presented frame
    pub fn frame(&self) -> &FrameBuffer {
        self.inner.front()
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        self.inner.pixel(x, y)
    }

    /// Number of frames presented so far
    pub fn presents(&self) -> u32 {
        self.inner.presents()
    }

    fn write_snapshot(&self, path: &Path) -> std::io::Result<()> {
        let frame = self.inner.front();
        // Write next to the target and rename so readers never see a torn image
        let partial = path.with_extension("ppm.tmp");
        let mut file = fs::File::create(&partial)?;
        file.write_all(&encode_ppm(frame))?;
        file.flush()?;
        drop(file);
        fs::rename(&partial, path)
    }
}

impl PanelDriver for HeadlessPanel {
    fn clear(&mut self) -> Result<(), PanelError> {
        self.inner.clear()
    }

    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), PanelError> {
        self.inner.set_pixel(x, y, color)
    }

    fn present(&mut self) -> Result<(), PanelError> {
        self.inner.present()?;
        if let Some(path) = &self.snapshot {
            match self.write_snapshot(path) {
                Ok(()) => debug!("Snapshot written to {}", path.display()),
                // A missing snapshot never stops the wall
                Err(e) => warn!("Failed to write snapshot {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        self.inner.dimensions()
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: Rgb) -> Result<(), PanelError> {
        self.inner.fill_rect(x, y, width, height, color)
    }
}

/// Encode a frame as binary PPM (P6)
pub fn encode_ppm(frame: &FrameBuffer) -> Vec<u8> {
    let header = format!("P6\n{} {}\n255\n", frame.width(), frame.height());
    let mut out = Vec::with_capacity(header.len() + frame.pixels().len() * 3);
    out.extend_from_slice(header.as_bytes());
    for pixel in frame.pixels() {
        out.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
    }
    out
}
