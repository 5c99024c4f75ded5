//! Image loading
//!
//! Resolves LoadGif file names under a root directory, decodes them with
//! the `image` crate and scales every frame to the element's size. GIFs keep
//! all frames and their delays; any other supported format becomes a single
//! still frame.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, RgbaImage};
use log::{debug, warn};

use lumawall_core::traits::{FrameSequence, ImageFrame, ImageSource, SourceError};

/// File-system backed image source
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    root: PathBuf,
}

impl ImageLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a file name from the wire to a path under the root
    ///
    /// Absolute paths and parent-directory components are refused.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(name);
        if name.is_empty() {
            return Err(SourceError::NotFound);
        }
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_absolute() || !confined {
            warn!("Refusing image path outside root: {}", name);
            return Err(SourceError::Forbidden);
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(SourceError::NotFound);
        }
        Ok(path)
    }
}

impl ImageSource for ImageLibrary {
    fn decode_and_scale(&self, path: &str, width: u16, height: u16) -> Result<FrameSequence, SourceError> {
        let path = self.resolve(path)?;
        let frames = if is_gif(&path) {
            decode_gif(&path)?
        } else {
            let still = image::open(&path).map_err(|e| {
                warn!("Cannot decode {}: {}", path.display(), e);
                SourceError::Decode
            })?;
            vec![(still.to_rgba8(), 0)]
        };

        debug!("Decoded {} ({} frames)", path.display(), frames.len());

        let scaled = frames
            .into_iter()
            .map(|(buffer, delay_ms)| scale_frame(buffer, width, height, delay_ms))
            .collect();
        FrameSequence::new(scaled)
    }
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"))
}

fn decode_gif(path: &Path) -> Result<Vec<(RgbaImage, u32)>, SourceError> {
    let file = File::open(path).map_err(|_| SourceError::Unreadable)?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(|e| {
        warn!("GIF decode error in {}: {}", path.display(), e);
        SourceError::Decode
    })?;

    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| {
            warn!("GIF frame decode error in {}: {}", path.display(), e);
            SourceError::Decode
        })?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        // Zero is kept; the scheduler substitutes its default
        let delay_ms = if denom > 0 { numer / denom } else { 0 };
        frames.push((frame.into_buffer(), delay_ms));
    }
    Ok(frames)
}

fn scale_frame(buffer: RgbaImage, width: u16, height: u16, delay_ms: u32) -> ImageFrame {
    let (w, h) = (width as u32, height as u32);
    let buffer = if buffer.dimensions() == (w, h) {
        buffer
    } else {
        imageops::resize(&buffer, w, h, FilterType::Triangle)
    };
    ImageFrame {
        width,
        height,
        delay_ms,
        pixels: buffer.pixels().map(|p| p.0).collect(),
    }
}
