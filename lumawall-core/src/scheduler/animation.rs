//! Time-based element animation
//!
//! Advances GIF frames, text scroll offsets and blink phases. Runs once per
//! main-loop iteration after commands have been applied; all timing is in
//! milliseconds of a monotonic clock supplied by the caller.

use log::trace;

use crate::config::TimingConfig;
use crate::element::ElementContent;
use crate::store::ElementStore;

/// Per-tick animation driver
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    timing: TimingConfig,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl AnimationScheduler {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Advance every active element whose interval has elapsed
    ///
    /// Returns true if any element changed. A visible change (blink toggle)
    /// marks the store dirty; frame and scroll changes are picked up by the
    /// renderer through `has_animated`.
    pub fn tick(&self, store: &mut ElementStore, now_ms: u64) -> bool {
        let (panel_w, _) = store.dimensions();
        let default_delay = self.timing.default_frame_delay_ms;
        let scroll_interval = self.timing.scroll_interval_ms as u64;
        let mut changed = false;
        let mut toggled = false;

        for element in store.iter_mut().filter(|e| e.active) {
            let x = element.rect.x;
            match &mut element.content {
                ElementContent::Gif(gif) => {
                    let delay = gif.frame_delay_ms(default_delay) as u64;
                    if now_ms.saturating_sub(gif.last_advance_ms) >= delay {
                        gif.current_frame = (gif.current_frame + 1) % gif.frames.len();
                        gif.last_advance_ms = now_ms;
                        changed = true;
                    }
                }
                ElementContent::Text(text) => {
                    if text.scrolls(x, panel_w)
                        && now_ms.saturating_sub(text.last_scroll_ms) >= scroll_interval
                    {
                        let span = text.rendered_width.max(1);
                        text.scroll_offset = (text.scroll_offset + 1) % span;
                        text.last_scroll_ms = now_ms;
                        changed = true;
                    }

                    if text.blinks()
                        && now_ms.saturating_sub(text.last_toggle_ms) >= text.blink_interval_ms as u64
                    {
                        text.blink_visible = !text.blink_visible;
                        text.last_toggle_ms = now_ms;
                        trace!("Element {} blink -> {}", element.id, text.blink_visible);
                        toggled = true;
                    }
                }
            }
        }

        if toggled {
            store.mark_dirty();
        }
        changed || toggled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Rect;
    use crate::store::tests::{text_spec, SolidImages};

    fn store_with_gif() -> ElementStore {
        let mut store = ElementStore::new(64, 32);
        store
            .upsert_gif(1, Rect::new(0, 0, 4, 4), "a.gif", &SolidImages, 0)
            .unwrap();
        store
    }

    fn frame_of(store: &ElementStore, id: u8) -> usize {
        store.get(id).unwrap().as_gif().unwrap().current_frame
    }

    #[test]
    fn test_zero_delay_uses_default() {
        let mut store = store_with_gif();
        let scheduler = AnimationScheduler::default();

        // First frame has delay 0, so the 100 ms default applies
        assert!(!scheduler.tick(&mut store, 99));
        assert_eq!(frame_of(&store, 1), 0);
        assert!(scheduler.tick(&mut store, 100));
        assert_eq!(frame_of(&store, 1), 1);
    }

    #[test]
    fn test_gif_frames_wrap() {
        let mut store = store_with_gif();
        let scheduler = AnimationScheduler::default();

        scheduler.tick(&mut store, 100);
        // Second frame carries a 50 ms delay
        assert!(!scheduler.tick(&mut store, 149));
        assert!(scheduler.tick(&mut store, 150));
        assert_eq!(frame_of(&store, 1), 0);
    }

    #[test]
    fn test_scroll_only_when_too_wide() {
        let mut store = ElementStore::new(64, 32);
        store.upsert_text(1, Rect::new(0, 0, 12, 8), text_spec("HI"), 0).unwrap();
        // 12 chars * 6 px = 72 px > 64 - 0
        store
            .upsert_text(2, Rect::new(0, 10, 72, 8), text_spec("ABCDEFGHIJKL"), 0)
            .unwrap();

        let scheduler = AnimationScheduler::default();
        assert!(scheduler.tick(&mut store, 1000));

        assert_eq!(store.get(1).unwrap().as_text().unwrap().scroll_offset, 0);
        assert_eq!(store.get(2).unwrap().as_text().unwrap().scroll_offset, 1);

        // Not again until another interval has passed
        scheduler.tick(&mut store, 1500);
        assert_eq!(store.get(2).unwrap().as_text().unwrap().scroll_offset, 1);
    }

    #[test]
    fn test_scroll_wraps_at_rendered_width() {
        let mut store = ElementStore::new(16, 8);
        let mut wide = text_spec("ABC");
        wide.rendered_width = 18;
        store.upsert_text(1, Rect::new(0, 0, 18, 8), wide, 0).unwrap();

        let scheduler = AnimationScheduler::new(TimingConfig {
            scroll_interval_ms: 10,
            ..TimingConfig::default()
        });
        for step in 1..=18 {
            scheduler.tick(&mut store, step * 10);
        }
        assert_eq!(store.get(1).unwrap().as_text().unwrap().scroll_offset, 0);
    }

    #[test]
    fn test_blink_toggles_and_marks_dirty() {
        let mut store = ElementStore::new(64, 32);
        let mut blinking = text_spec("ON");
        blinking.blink_interval_ms = 500;
        store.upsert_text(1, Rect::new(0, 0, 12, 8), blinking, 0).unwrap();
        store.clear_dirty();

        let scheduler = AnimationScheduler::default();
        scheduler.tick(&mut store, 499);
        assert!(!store.is_dirty());

        scheduler.tick(&mut store, 500);
        assert!(store.is_dirty());
        assert!(!store.get(1).unwrap().as_text().unwrap().blink_visible);

        store.clear_dirty();
        scheduler.tick(&mut store, 1000);
        assert!(store.get(1).unwrap().as_text().unwrap().blink_visible);
    }

    #[test]
    fn test_inactive_elements_frozen() {
        let mut store = store_with_gif();
        for element in store.iter_mut() {
            element.active = false;
        }
        assert!(!AnimationScheduler::default().tick(&mut store, 10_000));
        assert_eq!(frame_of(&store, 1), 0);
    }
}
