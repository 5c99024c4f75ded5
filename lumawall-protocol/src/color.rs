//! 24-bit colour as carried in text commands and painted on the panel

/// RGB colour, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `percent` (0-100)
    pub const fn scaled(self, percent: u8) -> Self {
        if percent >= 100 {
            return self;
        }
        let p = percent as u16;
        Self {
            r: (self.r as u16 * p / 100) as u8,
            g: (self.g as u16 * p / 100) as u8,
            b: (self.b as u16 * p / 100) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled() {
        assert_eq!(Rgb::WHITE.scaled(100), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.scaled(0), Rgb::BLACK);
        assert_eq!(Rgb::new(200, 100, 50).scaled(50), Rgb::new(100, 50, 25));
    }
}
