//! Two-pass compositor
//!
//! Paints every active image element first and every visible text element
//! second, so text always ends up on top. Painting happens into the panel's
//! back buffer and becomes visible with a single `present`.

use log::{debug, trace};

use lumawall_display::{PanelDriver, PanelError, Rgb};

use crate::element::{ElementContent, GifState, Rect, TextState};
use crate::store::ElementStore;
use crate::traits::GlyphSource;

use super::idle::draw_diagnostics;

/// Alpha below which an image pixel is treated as transparent
const ALPHA_THRESHOLD: u8 = 128;

/// What a render pass did to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderOutcome {
    /// Nothing changed; the panel was not touched
    Skipped,
    /// The idle screen was drawn
    Idle,
    /// Elements were composed and presented
    Painted,
}

/// Compositor state carried between frames
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    show_diagnostics: bool,
    /// Brightness the idle screen currently on the panel was drawn at
    idle_brightness: Option<u8>,
    frames_painted: u32,
}

impl RenderPipeline {
    pub fn new(show_diagnostics: bool) -> Self {
        Self {
            show_diagnostics,
            idle_brightness: None,
            frames_painted: 0,
        }
    }

    /// Compose one frame if anything needs repainting
    ///
    /// `brightness` is a percentage applied to every painted colour.
    pub fn render<P, G>(
        &mut self,
        store: &mut ElementStore,
        brightness: u8,
        panel: &mut P,
        glyphs: &G,
    ) -> Result<RenderOutcome, PanelError>
    where
        P: PanelDriver + ?Sized,
        G: GlyphSource + ?Sized,
    {
        let animated = store.has_animated();
        if !store.is_dirty() && !animated {
            return Ok(RenderOutcome::Skipped);
        }

        if !store.has_active() {
            store.clear_dirty();
            if self.idle_brightness == Some(brightness) {
                return Ok(RenderOutcome::Skipped);
            }
            panel.clear()?;
            if self.show_diagnostics {
                draw_diagnostics(panel, brightness)?;
            }
            panel.present()?;
            self.idle_brightness = Some(brightness);
            debug!("Idle screen drawn at {}%", brightness);
            return Ok(RenderOutcome::Idle);
        }

        panel.clear()?;

        for element in store.iter().filter(|e| e.active) {
            if let ElementContent::Gif(gif) = &element.content {
                paint_gif(panel, element.rect, gif, brightness)?;
            }
        }

        for element in store.iter().filter(|e| e.active) {
            if let ElementContent::Text(text) = &element.content {
                if text.blink_visible {
                    paint_text(panel, glyphs, element.rect, text, brightness)?;
                }
            }
        }

        store.clear_dirty();
        panel.present()?;
        self.idle_brightness = None;
        self.frames_painted = self.frames_painted.wrapping_add(1);
        trace!("Frame {} presented", self.frames_painted);
        Ok(RenderOutcome::Painted)
    }

    pub fn frames_painted(&self) -> u32 {
        self.frames_painted
    }
}

fn paint_gif<P: PanelDriver + ?Sized>(
    panel: &mut P,
    rect: Rect,
    gif: &GifState,
    brightness: u8,
) -> Result<(), PanelError> {
    let (panel_w, panel_h) = panel.dimensions();
    let frame = gif.current();
    let width = frame.width.min(rect.width);
    let height = frame.height.min(rect.height);

    for fy in 0..height {
        let py = rect.y as u32 + fy as u32;
        if py >= panel_h as u32 {
            break;
        }
        for fx in 0..width {
            let px = rect.x as u32 + fx as u32;
            if px >= panel_w as u32 {
                break;
            }
            let Some([r, g, b, a]) = frame.pixel(fx, fy) else {
                continue;
            };
            if a < ALPHA_THRESHOLD {
                continue;
            }
            panel.set_pixel(px as u16, py as u16, Rgb::new(r, g, b).scaled(brightness))?;
        }
    }
    Ok(())
}

/// Clip window for text: from the element's x to the panel edges
#[derive(Clone, Copy)]
struct Clip {
    left: i32,
    right: i32,
    bottom: i32,
}

fn paint_text<P, G>(
    panel: &mut P,
    glyphs: &G,
    rect: Rect,
    text: &TextState,
    brightness: u8,
) -> Result<(), PanelError>
where
    P: PanelDriver + ?Sized,
    G: GlyphSource + ?Sized,
{
    let (panel_w, panel_h) = panel.dimensions();
    let clip = Clip {
        left: rect.x as i32,
        right: panel_w as i32,
        bottom: panel_h as i32,
    };
    let scale = text.font_scale.max(1) as i32;
    let baseline = rect.y as i32 + glyphs.metrics(&text.font).ascent as i32 * scale;
    let color = text.color.rgb().scaled(brightness);

    // A scrolling line is followed by a second copy so it wraps seamlessly
    let start = rect.x as i32 - text.scroll_offset as i32;
    let wrap = text
        .scrolls(rect.x, panel_w)
        .then_some(start + text.rendered_width as i32);

    for origin in core::iter::once(start).chain(wrap) {
        let mut pen = origin;
        for ch in text.content.chars() {
            if pen >= clip.right {
                break;
            }
            let Some(glyph) = glyphs
                .glyph(&text.font, ch)
                .or_else(|| glyphs.glyph(&text.font, '?'))
            else {
                continue;
            };

            let left = pen + glyph.x_offset as i32 * scale;
            let top = baseline - (glyph.y_offset as i32 + glyph.height as i32) * scale;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    if glyph.is_set(col, row) {
                        fill_block(
                            panel,
                            left + col as i32 * scale,
                            top + row as i32 * scale,
                            scale,
                            clip,
                            color,
                        )?;
                    }
                }
            }
            pen += glyph.advance as i32 * scale;
        }
    }
    Ok(())
}

fn fill_block<P: PanelDriver + ?Sized>(
    panel: &mut P,
    x: i32,
    y: i32,
    scale: i32,
    clip: Clip,
    color: Rgb,
) -> Result<(), PanelError> {
    for py in y.max(0)..(y + scale).min(clip.bottom) {
        for px in x.max(clip.left)..(x + scale).min(clip.right) {
            panel.set_pixel(px as u16, py as u16, color)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BuiltinFont;
    use crate::store::tests::{text_spec, SolidImages};
    use lumawall_display::MemoryPanel;

    #[test]
    fn test_idle_drawn_once() {
        let mut store = ElementStore::new(64, 64);
        let mut panel = MemoryPanel::new(64, 64);
        let mut pipeline = RenderPipeline::new(true);

        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Idle
        );
        assert_eq!(panel.pixel(5, 5), Some(Rgb::RED));
        assert!(!store.is_dirty());

        store.mark_dirty();
        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Skipped
        );
        assert_eq!(panel.presents(), 1);
    }

    #[test]
    fn test_idle_redrawn_on_brightness_change() {
        let mut store = ElementStore::new(64, 64);
        let mut panel = MemoryPanel::new(64, 64);
        let mut pipeline = RenderPipeline::new(true);

        pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap();
        assert_eq!(panel.pixel(5, 5), Some(Rgb::RED));

        store.mark_dirty();
        assert_eq!(
            pipeline.render(&mut store, 10, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Idle
        );
        assert_eq!(panel.pixel(5, 5), Some(Rgb::new(25, 0, 0)));
        assert_eq!(panel.presents(), 2);
    }

    #[test]
    fn test_idle_blank_without_diagnostics() {
        let mut store = ElementStore::new(32, 32);
        let mut panel = MemoryPanel::new(32, 32);
        let mut pipeline = RenderPipeline::new(false);

        pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap();
        assert_eq!(panel.front().lit_pixels(), 0);
        assert_eq!(panel.presents(), 1);
    }

    #[test]
    fn test_clean_static_store_skipped() {
        let mut store = ElementStore::new(64, 32);
        store.upsert_text(1, Rect::new(0, 0, 12, 8), text_spec("HI"), 0).unwrap();
        let mut panel = MemoryPanel::new(64, 32);
        let mut pipeline = RenderPipeline::new(true);

        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Painted
        );
        let writes = panel.pixel_writes();
        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Skipped
        );
        assert_eq!(panel.pixel_writes(), writes);
    }

    #[test]
    fn test_text_painted_over_gif() {
        let mut store = ElementStore::new(64, 32);
        // Text inserted before the image still paints on top
        store.upsert_text(2, Rect::new(0, 0, 6, 8), text_spec("I"), 0).unwrap();
        store
            .upsert_gif(1, Rect::new(0, 0, 16, 16), "a.gif", &SolidImages, 0)
            .unwrap();

        let mut panel = MemoryPanel::new(64, 32);
        RenderPipeline::new(true)
            .render(&mut store, 100, &mut panel, &BuiltinFont)
            .unwrap();

        // Stem of 'I' is column 2, rows 0..7
        assert_eq!(panel.pixel(2, 3), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(0, 3), Some(Rgb::RED));
        assert_eq!(panel.pixel(10, 10), Some(Rgb::RED));
        assert_eq!(panel.pixel(20, 20), Some(Rgb::BLACK));
    }

    #[test]
    fn test_text_scale() {
        let mut store = ElementStore::new(64, 32);
        let mut big = text_spec("I");
        big.font_scale = 2;
        store.upsert_text(1, Rect::new(4, 2, 12, 16), big, 0).unwrap();

        let mut panel = MemoryPanel::new(64, 32);
        RenderPipeline::new(true)
            .render(&mut store, 100, &mut panel, &BuiltinFont)
            .unwrap();

        // Column 2 scaled by 2 covers x 8..10, rows 2..16
        assert_eq!(panel.pixel(8, 2), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(9, 15), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(10, 4), Some(Rgb::BLACK));
        assert_eq!(panel.pixel(8, 16), Some(Rgb::BLACK));
    }

    #[test]
    fn test_hidden_blink_phase_not_painted() {
        let mut store = ElementStore::new(64, 32);
        let mut blinking = text_spec("I");
        blinking.blink_interval_ms = 500;
        store.upsert_text(1, Rect::new(0, 0, 6, 8), blinking, 0).unwrap();
        for element in store.iter_mut() {
            if let ElementContent::Text(text) = &mut element.content {
                text.blink_visible = false;
            }
        }

        let mut panel = MemoryPanel::new(64, 32);
        RenderPipeline::new(true)
            .render(&mut store, 100, &mut panel, &BuiltinFont)
            .unwrap();
        assert_eq!(panel.front().lit_pixels(), 0);
    }

    #[test]
    fn test_transparent_pixels_skipped() {
        use crate::traits::{FrameSequence, ImageFrame, ImageSource, SourceError};
        use alloc::vec;

        struct Clear;
        impl ImageSource for Clear {
            fn decode_and_scale(&self, _: &str, w: u16, h: u16) -> Result<FrameSequence, SourceError> {
                FrameSequence::new(vec![ImageFrame::solid(w, h, [255, 255, 255, 100], 0)])
            }
        }

        let mut store = ElementStore::new(16, 16);
        store.upsert_gif(1, Rect::new(0, 0, 8, 8), "x", &Clear, 0).unwrap();
        let mut panel = MemoryPanel::new(16, 16);
        RenderPipeline::new(true)
            .render(&mut store, 100, &mut panel, &BuiltinFont)
            .unwrap();
        assert_eq!(panel.front().lit_pixels(), 0);
    }

    #[test]
    fn test_brightness_scales_colors() {
        let mut store = ElementStore::new(16, 16);
        store
            .upsert_gif(1, Rect::new(0, 0, 4, 4), "a.gif", &SolidImages, 0)
            .unwrap();
        let mut panel = MemoryPanel::new(16, 16);
        RenderPipeline::new(true)
            .render(&mut store, 20, &mut panel, &BuiltinFont)
            .unwrap();
        assert_eq!(panel.pixel(1, 1), Some(Rgb::new(51, 0, 0)));
    }

    #[test]
    fn test_scrolled_text_clipped_at_origin() {
        let mut store = ElementStore::new(16, 8);
        store.upsert_text(1, Rect::new(4, 0, 24, 8), text_spec("IIII"), 0).unwrap();
        for element in store.iter_mut() {
            if let ElementContent::Text(text) = &mut element.content {
                text.scroll_offset = 4;
            }
        }

        let mut panel = MemoryPanel::new(16, 8);
        RenderPipeline::new(true)
            .render(&mut store, 100, &mut panel, &BuiltinFont)
            .unwrap();

        // Nothing left of the element origin
        for y in 0..8 {
            for x in 0..4 {
                assert_eq!(panel.pixel(x, y), Some(Rgb::BLACK));
            }
        }
        // First stem moved from x=6 to x=2 and is clipped, second is at x=8
        assert_eq!(panel.pixel(8, 3), Some(Rgb::WHITE));
        assert_eq!(panel.pixel(14, 3), Some(Rgb::WHITE));
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut store = ElementStore::new(64, 64);
        let mut panel = MemoryPanel::new(64, 64);
        let mut pipeline = RenderPipeline::new(true);

        pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap();
        store.upsert_text(1, Rect::new(30, 30, 6, 8), text_spec("I"), 0).unwrap();
        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Painted
        );
        store.clear_all();
        assert_eq!(
            pipeline.render(&mut store, 100, &mut panel, &BuiltinFont).unwrap(),
            RenderOutcome::Idle
        );
        assert_eq!(panel.pixel(5, 5), Some(Rgb::RED));
    }
}
