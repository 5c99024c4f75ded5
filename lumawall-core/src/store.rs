//! Element store
//!
//! Authoritative, insertion-ordered registry of the elements shown on one
//! screen, plus the global dirty flag that gates repainting. Every
//! operation runs to completion on the processing thread.

use alloc::string::String;
use alloc::vec::Vec;

use log::debug;

use crate::element::{DisplayElement, ElementContent, ElementId, ElementKind, GifState, Rect, TextState};
use crate::palette::ColorIndex;
use crate::traits::{ImageSource, SourceError};

/// Reasons a store mutation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Element geometry is outside the panel
    Bounds,
    /// The image could not be resolved
    Source(SourceError),
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::Bounds => write!(f, "element outside panel bounds"),
            StoreError::Source(e) => write!(f, "{}", e),
        }
    }
}

/// Text element fields supplied by a DisplayText command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    pub content: String,
    pub font: String,
    pub font_scale: u8,
    pub color: ColorIndex,
    pub blink_interval_ms: u16,
    /// Laid-out width at `font_scale`
    pub rendered_width: u16,
}

/// Registry of live display elements
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: Vec<DisplayElement>,
    panel_w: u16,
    panel_h: u16,
    dirty: bool,
    revision: u32,
}

impl ElementStore {
    /// Create an empty store for a `panel_w` x `panel_h` panel
    ///
    /// Starts dirty so the first render pass draws the idle pattern.
    pub fn new(panel_w: u16, panel_h: u16) -> Self {
        Self {
            elements: Vec::new(),
            panel_w,
            panel_h,
            dirty: true,
            revision: 0,
        }
    }

    /// Insert or fully replace an image element
    ///
    /// Geometry is checked and the image resolved before anything is
    /// removed, so a rejected command leaves an existing element intact.
    /// A replaced element moves to the end of the paint order.
    pub fn upsert_gif<I: ImageSource + ?Sized>(
        &mut self,
        id: ElementId,
        rect: Rect,
        source: &str,
        images: &I,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        if !rect.fits_within(self.panel_w, self.panel_h) {
            return Err(StoreError::Bounds);
        }

        let frames = images
            .decode_and_scale(source, rect.width, rect.height)
            .map_err(StoreError::Source)?;

        if self.remove(id) {
            debug!("Replacing element {}", id);
        }

        self.elements.push(DisplayElement {
            id,
            rect,
            active: true,
            content: ElementContent::Gif(GifState {
                source: String::from(source),
                frames,
                current_frame: 0,
                last_advance_ms: now_ms,
            }),
        });
        self.touch();
        Ok(())
    }

    /// Insert a text element or update an existing one in place
    ///
    /// An in-place update keeps the element's slot, so there is no frame in
    /// which it is missing. Scrolling restarts when the content changes and
    /// blinking restarts when the interval changes. An image element with
    /// the same id is replaced, and only then is the origin checked against
    /// the panel.
    pub fn upsert_text(&mut self, id: ElementId, rect: Rect, update: TextSpec, now_ms: u64) -> Result<(), StoreError> {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
            if let ElementContent::Text(text) = &mut element.content {
                if text.content != update.content {
                    text.scroll_offset = 0;
                    text.last_scroll_ms = now_ms;
                }
                if text.blink_interval_ms != update.blink_interval_ms {
                    text.blink_visible = true;
                    text.last_toggle_ms = now_ms;
                }
                text.content = update.content;
                text.font = update.font;
                text.font_scale = update.font_scale;
                text.color = update.color;
                text.blink_interval_ms = update.blink_interval_ms;
                text.rendered_width = update.rendered_width;
                element.rect = rect;
                element.active = true;
                self.touch();
                return Ok(());
            }
        }

        // Only new elements are bounds-checked
        if !rect.origin_within(self.panel_w, self.panel_h) {
            return Err(StoreError::Bounds);
        }

        if self.remove(id) {
            debug!("Element {} changes kind to text", id);
        }

        self.elements.push(DisplayElement {
            id,
            rect,
            active: true,
            content: ElementContent::Text(TextState {
                content: update.content,
                font: update.font,
                font_scale: update.font_scale,
                color: update.color,
                scroll_offset: 0,
                last_scroll_ms: now_ms,
                blink_interval_ms: update.blink_interval_ms,
                blink_visible: true,
                last_toggle_ms: now_ms,
                rendered_width: update.rendered_width,
            }),
        });
        self.touch();
        Ok(())
    }

    /// Remove one element; false if it did not exist
    pub fn delete(&mut self, id: ElementId) -> bool {
        let removed = self.remove(id);
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove every element
    pub fn clear_all(&mut self) {
        self.elements.clear();
        self.touch();
    }

    /// Remove every text element, keeping images
    ///
    /// Returns the number of elements removed.
    pub fn clear_text_only(&mut self) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| e.kind() != ElementKind::Text);
        self.touch();
        before - self.elements.len()
    }

    pub fn get(&self, id: ElementId) -> Option<&DisplayElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements in paint order
    pub fn iter(&self) -> impl Iterator<Item = &DisplayElement> {
        self.elements.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DisplayElement> {
        self.elements.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn has_active(&self) -> bool {
        self.elements.iter().any(|e| e.active)
    }

    /// Any image, scrolling text or blinking text
    pub fn has_animated(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.active && e.is_animated(self.panel_w))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Count of applied mutations, for observing idempotence
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Panel (width, height) used for bounds checks
    pub fn dimensions(&self) -> (u16, u16) {
        (self.panel_w, self.panel_h)
    }

    fn remove(&mut self, id: ElementId) -> bool {
        match self.elements.iter().position(|e| e.id == id) {
            Some(index) => {
                self.elements.remove(index);
                true
            }
            None => false,
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::traits::{FrameSequence, ImageFrame};
    use alloc::vec;

    /// Image source producing solid frames for names ending in `.gif`
    pub struct SolidImages;

    impl ImageSource for SolidImages {
        fn decode_and_scale(&self, path: &str, width: u16, height: u16) -> Result<FrameSequence, SourceError> {
            if !path.ends_with(".gif") {
                return Err(SourceError::NotFound);
            }
            FrameSequence::new(vec![
                ImageFrame::solid(width, height, [255, 0, 0, 255], 0),
                ImageFrame::solid(width, height, [0, 0, 255, 255], 50),
            ])
        }
    }

    pub fn text_spec(content: &str) -> TextSpec {
        TextSpec {
            content: String::from(content),
            font: String::new(),
            font_scale: 1,
            color: ColorIndex(0xFF),
            blink_interval_ms: 0,
            rendered_width: content.len() as u16 * 6,
        }
    }

    #[test]
    fn test_upsert_gif_inserts() {
        let mut store = ElementStore::new(64, 32);
        store.clear_dirty();
        store
            .upsert_gif(1, Rect::new(0, 0, 16, 16), "a.gif", &SolidImages, 0)
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.is_dirty());
        assert!(store.get(1).unwrap().active);
        assert_eq!(store.get(1).unwrap().as_gif().unwrap().frames.len(), 2);
    }

    #[test]
    fn test_gif_bounds_rejected() {
        let mut store = ElementStore::new(64, 32);
        let result = store.upsert_gif(1, Rect::new(60, 0, 5, 5), "a.gif", &SolidImages, 0);
        assert_eq!(result, Err(StoreError::Bounds));
        assert!(store.is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_failed_gif_keeps_existing() {
        let mut store = ElementStore::new(64, 32);
        store
            .upsert_gif(1, Rect::new(0, 0, 8, 8), "a.gif", &SolidImages, 0)
            .unwrap();

        let result = store.upsert_gif(1, Rect::new(0, 0, 8, 8), "missing.png", &SolidImages, 0);
        assert_eq!(result, Err(StoreError::Source(SourceError::NotFound)));
        assert_eq!(store.get(1).unwrap().as_gif().unwrap().source, "a.gif");
    }

    #[test]
    fn test_gif_replace_moves_to_end() {
        let mut store = ElementStore::new(64, 32);
        store
            .upsert_gif(1, Rect::new(0, 0, 8, 8), "a.gif", &SolidImages, 0)
            .unwrap();
        store
            .upsert_gif(2, Rect::new(8, 0, 8, 8), "b.gif", &SolidImages, 0)
            .unwrap();
        store
            .upsert_gif(1, Rect::new(16, 0, 8, 8), "c.gif", &SolidImages, 0)
            .unwrap();

        let ids: Vec<_> = store.iter().map(|e| e.id).collect();
        assert_eq!(ids, [2, 1]);
        assert_eq!(store.get(1).unwrap().rect.x, 16);
    }

    #[test]
    fn test_text_update_in_place() {
        let mut store = ElementStore::new(64, 32);
        store.upsert_text(5, Rect::new(0, 0, 12, 8), text_spec("HI"), 0).unwrap();
        store
            .upsert_text(9, Rect::new(0, 10, 12, 8), text_spec("YO"), 0)
            .unwrap();
        store
            .upsert_text(5, Rect::new(2, 2, 18, 8), text_spec("HEY"), 10)
            .unwrap();

        assert_eq!(store.len(), 2);
        // Slot kept: still painted first
        let first = store.iter().next().unwrap();
        assert_eq!(first.id, 5);
        assert_eq!(first.rect.x, 2);
        assert_eq!(first.as_text().unwrap().content, "HEY");
    }

    #[test]
    fn test_text_bounds_rejected() {
        let mut store = ElementStore::new(64, 32);
        let result = store.upsert_text(5, Rect::new(64, 0, 6, 8), text_spec("X"), 0);
        assert_eq!(result, Err(StoreError::Bounds));
        assert!(store.is_empty());
    }

    #[test]
    fn test_text_update_skips_bounds() {
        let mut store = ElementStore::new(64, 32);
        store.upsert_text(5, Rect::new(0, 0, 6, 8), text_spec("A"), 0).unwrap();

        let result = store.upsert_text(5, Rect::new(70, 0, 6, 8), text_spec("B"), 10);
        assert_eq!(result, Ok(()));
        let element = store.get(5).unwrap();
        assert_eq!(element.rect.x, 70);
        assert_eq!(element.as_text().unwrap().content, "B");
    }

    #[test]
    fn test_kind_replacement() {
        let mut store = ElementStore::new(64, 32);
        store
            .upsert_gif(3, Rect::new(0, 0, 8, 8), "a.gif", &SolidImages, 0)
            .unwrap();
        store.upsert_text(3, Rect::new(0, 0, 6, 8), text_spec("T"), 0).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(3).unwrap().kind(), ElementKind::Text);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut store = ElementStore::new(64, 32);
        store
            .upsert_gif(1, Rect::new(0, 0, 8, 8), "a.gif", &SolidImages, 0)
            .unwrap();
        store.upsert_text(2, Rect::new(0, 0, 6, 8), text_spec("A"), 0).unwrap();
        store.upsert_text(3, Rect::new(0, 9, 6, 8), text_spec("B"), 0).unwrap();

        assert!(!store.delete(42));
        assert!(store.delete(2));
        assert_eq!(store.len(), 2);

        store.clear_dirty();
        assert_eq!(store.clear_text_only(), 1);
        assert!(store.is_dirty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().kind(), ElementKind::Gif);

        store.clear_all();
        assert!(store.is_empty());
        assert!(!store.has_active());
    }

    proptest::proptest! {
        #[test]
        fn prop_ids_stay_unique(ops in proptest::collection::vec((0u8..8, proptest::bool::ANY, 0u16..80), 1..64)) {
            let mut store = ElementStore::new(64, 32);
            for (id, is_text, x) in ops {
                let _ = if is_text {
                    store.upsert_text(id, Rect::new(x, 0, 6, 8), text_spec("A"), 0)
                } else {
                    store.upsert_gif(id, Rect::new(x, 0, 4, 4), "a.gif", &SolidImages, 0)
                };
                let mut ids: Vec<_> = store.iter().map(|e| e.id).collect();
                let len = ids.len();
                ids.sort_unstable();
                ids.dedup();
                proptest::prop_assert_eq!(ids.len(), len);
                proptest::prop_assert!(store.len() <= 8);
            }
        }
    }

    #[test]
    fn test_has_animated() {
        let mut store = ElementStore::new(64, 32);
        store.upsert_text(1, Rect::new(0, 0, 12, 8), text_spec("HI"), 0).unwrap();
        assert!(!store.has_animated());

        let mut blinking = text_spec("HI");
        blinking.blink_interval_ms = 500;
        store.upsert_text(1, Rect::new(0, 0, 12, 8), blinking, 0).unwrap();
        assert!(store.has_animated());

        store.clear_all();
        store
            .upsert_text(2, Rect::new(40, 0, 66, 8), text_spec("ELEVEN CHARS"), 0)
            .unwrap();
        assert!(store.has_animated());
    }
}
