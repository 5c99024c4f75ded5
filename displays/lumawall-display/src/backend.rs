//! Panel driver trait
//!
//! Defines the primitives the compositor needs from a panel.

use lumawall_protocol::Rgb;

/// Panel driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// Pixel outside the panel
    InvalidCoordinates,
    /// The panel could not latch the new frame
    PresentFailed,
    /// Panel not initialized
    NotInitialized,
}

impl core::fmt::Display for PanelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PanelError::InvalidCoordinates => write!(f, "pixel outside panel"),
            PanelError::PresentFailed => write!(f, "failed to present frame"),
            PanelError::NotInitialized => write!(f, "panel not initialized"),
        }
    }
}

/// Panel driver trait
///
/// All drawing goes to an off-screen buffer; nothing is visible until
/// [`PanelDriver::present`] swaps it in.
pub trait PanelDriver {
    /// Clear the back buffer to black
    fn clear(&mut self) -> Result<(), PanelError>;

    /// Set one pixel in the back buffer
    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), PanelError>;

    /// Swap the back buffer onto the panel
    fn present(&mut self) -> Result<(), PanelError>;

    /// Get the panel dimensions as (width, height) in pixels
    fn dimensions(&self) -> (u16, u16);

    /// Fill a rectangle, clipped to the panel
    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: Rgb) -> Result<(), PanelError> {
        let (panel_w, panel_h) = self.dimensions();
        let x_end = x.saturating_add(width).min(panel_w);
        let y_end = y.saturating_add(height).min(panel_h);
        for py in y..y_end {
            for px in x..x_end {
                self.set_pixel(px, py, color)?;
            }
        }
        Ok(())
    }
}
