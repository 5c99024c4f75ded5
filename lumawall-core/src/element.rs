//! Display element types

use alloc::string::String;

use crate::palette::ColorIndex;
use crate::traits::{FrameSequence, ImageFrame};

/// Element key, unique within one screen
pub type ElementId = u8;

/// Element variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ElementKind {
    Gif,
    Text,
}

impl ElementKind {
    pub fn other(self) -> Self {
        match self {
            ElementKind::Gif => ElementKind::Text,
            ElementKind::Text => ElementKind::Gif,
        }
    }
}

/// Pixel rectangle on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the whole rectangle lies on a `panel_w` x `panel_h` panel
    pub fn fits_within(&self, panel_w: u16, panel_h: u16) -> bool {
        self.x as u32 + self.width as u32 <= panel_w as u32
            && self.y as u32 + self.height as u32 <= panel_h as u32
    }

    /// Whether the top-left corner lies on the panel
    pub fn origin_within(&self, panel_w: u16, panel_h: u16) -> bool {
        self.x < panel_w && self.y < panel_h
    }
}

/// Animation state of an image element
#[derive(Debug, Clone)]
pub struct GifState {
    /// File reference the frames were loaded from
    pub source: String,
    pub frames: FrameSequence,
    pub current_frame: usize,
    pub last_advance_ms: u64,
}

impl GifState {
    pub fn current(&self) -> &ImageFrame {
        self.frames.frame(self.current_frame)
    }

    /// Delay of the current frame, substituting `default_ms` for zero
    pub fn frame_delay_ms(&self, default_ms: u32) -> u32 {
        match self.current().delay_ms {
            0 => default_ms,
            delay => delay,
        }
    }
}

/// Content and animation state of a text element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextState {
    pub content: String,
    /// Font name as sent; empty selects the built-in font
    pub font: String,
    pub font_scale: u8,
    pub color: ColorIndex,
    /// Horizontal scroll position in pixels
    pub scroll_offset: u16,
    pub last_scroll_ms: u64,
    /// Blink half-period, 0 when not blinking
    pub blink_interval_ms: u16,
    pub blink_visible: bool,
    pub last_toggle_ms: u64,
    /// Width of the laid-out text at its scale
    pub rendered_width: u16,
}

impl TextState {
    /// Whether the text is wider than the space right of `x`
    pub fn scrolls(&self, x: u16, panel_w: u16) -> bool {
        self.rendered_width > panel_w.saturating_sub(x)
    }

    pub fn blinks(&self) -> bool {
        self.blink_interval_ms > 0
    }
}

/// Element payload
#[derive(Debug, Clone)]
pub enum ElementContent {
    Gif(GifState),
    Text(TextState),
}

/// A positioned, addressable unit of content
#[derive(Debug, Clone)]
pub struct DisplayElement {
    pub id: ElementId,
    pub rect: Rect,
    pub active: bool,
    pub content: ElementContent,
}

impl DisplayElement {
    pub fn kind(&self) -> ElementKind {
        match self.content {
            ElementContent::Gif(_) => ElementKind::Gif,
            ElementContent::Text(_) => ElementKind::Text,
        }
    }

    pub fn as_text(&self) -> Option<&TextState> {
        match &self.content {
            ElementContent::Text(text) => Some(text),
            ElementContent::Gif(_) => None,
        }
    }

    pub fn as_gif(&self) -> Option<&GifState> {
        match &self.content {
            ElementContent::Gif(gif) => Some(gif),
            ElementContent::Text(_) => None,
        }
    }

    /// Whether this element changes over time without new commands
    pub fn is_animated(&self, panel_w: u16) -> bool {
        match &self.content {
            ElementContent::Gif(_) => true,
            ElementContent::Text(text) => text.blinks() || text.scrolls(self.rect.x, panel_w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounds() {
        assert!(Rect::new(0, 0, 192, 192).fits_within(192, 192));
        assert!(!Rect::new(1, 0, 192, 10).fits_within(192, 192));
        assert!(!Rect::new(0, 100, 10, 93).fits_within(192, 192));
        // No overflow near u16::MAX
        assert!(!Rect::new(u16::MAX, 0, 2, 1).fits_within(192, 192));
    }

    #[test]
    fn test_origin_within() {
        assert!(Rect::new(191, 191, 500, 500).origin_within(192, 192));
        assert!(!Rect::new(192, 0, 1, 1).origin_within(192, 192));
    }

    #[test]
    fn test_text_scrolls() {
        let text = TextState {
            content: String::from("WIDE"),
            font: String::new(),
            font_scale: 1,
            color: ColorIndex::default(),
            scroll_offset: 0,
            last_scroll_ms: 0,
            blink_interval_ms: 0,
            blink_visible: true,
            last_toggle_ms: 0,
            rendered_width: 24,
        };
        assert!(!text.scrolls(0, 32));
        assert!(!text.scrolls(8, 32));
        assert!(text.scrolls(9, 32));
        assert!(text.scrolls(40, 32));
    }
}
