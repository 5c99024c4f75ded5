//! Fixed RGB332 colour palette
//!
//! Text colours are stored as palette indices. The table is evaluated at
//! compile time and never mutated.

use lumawall_protocol::Rgb;

/// Index into [`PALETTE`] (3 bits red, 3 bits green, 2 bits blue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorIndex(pub u8);

impl ColorIndex {
    /// Nearest palette entry for a 24-bit colour
    pub const fn from_rgb(color: Rgb) -> Self {
        Self((color.r & 0xE0) | ((color.g & 0xE0) >> 3) | (color.b >> 6))
    }

    pub fn rgb(self) -> Rgb {
        PALETTE[self.0 as usize]
    }
}

const fn build_palette() -> [Rgb; 256] {
    let mut table = [Rgb::BLACK; 256];
    let mut i = 0;
    while i < 256 {
        let r = (i >> 5) & 0x07;
        let g = (i >> 2) & 0x07;
        let b = i & 0x03;
        table[i] = Rgb::new((r * 255 / 7) as u8, (g * 255 / 7) as u8, (b * 255 / 3) as u8);
        i += 1;
    }
    table
}

/// RGB332 expansion table
pub static PALETTE: [Rgb; 256] = build_palette();
