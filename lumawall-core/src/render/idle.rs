//! Idle screen
//!
//! Shown while no element is active. The diagnostic pattern makes panel
//! orientation and chaining mistakes obvious at a glance.

use lumawall_display::{PanelDriver, PanelError, Rgb};

/// Side length of the corner squares and length of the centre cross arms
pub const MARKER_SIZE: u16 = 20;

/// Draw the diagnostic pattern into the back buffer
///
/// Red, green, blue and yellow squares mark the top-left, top-right,
/// bottom-left and bottom-right corners. A white cross starts at the
/// centre and a white border outlines the panel.
pub fn draw_diagnostics<P: PanelDriver + ?Sized>(panel: &mut P, brightness: u8) -> Result<(), PanelError> {
    let (width, height) = panel.dimensions();
    if width == 0 || height == 0 {
        return Ok(());
    }
    let size = MARKER_SIZE.min(width).min(height);
    let white = Rgb::WHITE.scaled(brightness);

    panel.fill_rect(0, 0, size, size, Rgb::RED.scaled(brightness))?;
    panel.fill_rect(width - size, 0, size, size, Rgb::GREEN.scaled(brightness))?;
    panel.fill_rect(0, height - size, size, size, Rgb::BLUE.scaled(brightness))?;
    panel.fill_rect(width - size, height - size, size, size, Rgb::YELLOW.scaled(brightness))?;

    let (cx, cy) = (width / 2, height / 2);
    panel.fill_rect(cx, cy, MARKER_SIZE, 1, white)?;
    panel.fill_rect(cx, cy, 1, MARKER_SIZE, white)?;

    panel.fill_rect(0, 0, width, 1, white)?;
    panel.fill_rect(0, height - 1, width, 1, white)?;
    panel.fill_rect(0, 0, 1, height, white)?;
    panel.fill_rect(width - 1, 0, 1, height, white)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumawall_display::MemoryPanel;

    #[test]
    fn test_diagnostic_pattern() {
        let mut panel = MemoryPanel::new(192, 192);
        draw_diagnostics(&mut panel, 100).unwrap();
        panel.present().unwrap();

        assert_eq!(panel.pixel(5, 5), Some(Rgb::RED));
        assert_eq!(panel.pixel(186, 5), Some(Rgb::GREEN));
        assert_eq!(panel.pixel(5, 186), Some(Rgb::BLUE));
        assert_eq!(panel.pixel(186, 186), Some(Rgb::YELLOW));
        // Border wins over the corner squares
        assert_eq!(panel.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(96, 96), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(115, 96), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(96, 115), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(95, 95), Some(Rgb::BLACK));
    }

    #[test]
    fn test_diagnostic_pattern_dimmed() {
        let mut panel = MemoryPanel::new(64, 64);
        draw_diagnostics(&mut panel, 50).unwrap();
        panel.present().unwrap();
        assert_eq!(panel.pixel(5, 5), Some(Rgb::new(127, 0, 0)));
    }

    #[test]
    fn test_tiny_panel() {
        let mut panel = MemoryPanel::new(8, 4);
        assert!(draw_diagnostics(&mut panel, 100).is_ok());
    }
}
