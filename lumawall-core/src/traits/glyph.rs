//! Glyph source trait
//!
//! Maps a font name and a character to a bitmap with metrics. Font names
//! come straight from DisplayText commands; an empty or unknown name is
//! resolved by the implementation (usually to the built-in font).

/// Glyph bitmap storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphBitmap<'a> {
    /// One byte per column, bit 0 is the top row
    Columns(&'a [u8]),
    /// BDF-style rows, `stride` bytes per row, most significant bit first
    Rows { data: &'a [u8], stride: usize },
}

/// A single rasterized glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph<'a> {
    pub width: u8,
    pub height: u8,
    /// Horizontal offset from the pen position
    pub x_offset: i8,
    /// Offset of the bitmap's bottom edge above the baseline
    pub y_offset: i8,
    /// Pen advance after drawing
    pub advance: u8,
    pub bitmap: GlyphBitmap<'a>,
}

impl Glyph<'_> {
    /// Whether the pixel at (`col`, `row`) is set, row 0 being the top
    pub fn is_set(&self, col: u8, row: u8) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        match self.bitmap {
            GlyphBitmap::Columns(columns) => columns
                .get(col as usize)
                .is_some_and(|bits| bits & (1 << row) != 0),
            GlyphBitmap::Rows { data, stride } => data
                .get(row as usize * stride + col as usize / 8)
                .is_some_and(|byte| byte & (0x80 >> (col % 8)) != 0),
        }
    }
}

/// Vertical font metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Pixels above the baseline
    pub ascent: u8,
    /// Pixels below the baseline
    pub descent: u8,
}

impl FontMetrics {
    pub fn line_height(&self) -> u16 {
        self.ascent as u16 + self.descent as u16
    }
}

/// Glyph source collaborator
pub trait GlyphSource {
    /// Look up a glyph; `None` if the font has no such character
    fn glyph(&self, font: &str, ch: char) -> Option<Glyph<'_>>;

    /// Vertical metrics of a font
    fn metrics(&self, font: &str) -> FontMetrics;

    /// Width of `text` in pixels at integer `scale`
    ///
    /// Missing characters are measured as `?`.
    fn text_width(&self, font: &str, text: &str, scale: u8) -> u16 {
        let unscaled: u32 = text
            .chars()
            .map(|ch| {
                self.glyph(font, ch)
                    .or_else(|| self.glyph(font, '?'))
                    .map_or(0, |g| g.advance as u32)
            })
            .sum();
        (unscaled * scale.max(1) as u32).min(u16::MAX as u32) as u16
    }
}
