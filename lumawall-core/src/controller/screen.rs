//! Command application for one screen
//!
//! The controller owns the element store, the retransmission filter and the
//! brightness setting. Frames are admitted into the command queue here and
//! commands are applied one at a time, each yielding exactly one reply.

use core::fmt::Write;

use alloc::string::String;
use log::{debug, info, warn};

use lumawall_protocol::{validate, Command, DecodeError, Frame, GifCommand, ResponseCode, TextCommand};

use crate::config::PanelConfig;
use crate::dedup::{gif_fingerprint, text_fingerprint, DedupCache};
use crate::element::{ElementKind, Rect};
use crate::palette::ColorIndex;
use crate::queue::CommandQueue;
use crate::store::{ElementStore, StoreError, TextSpec};
use crate::traits::{GlyphSource, ImageSource};

use super::reply::{Reply, REPLY_DATA_LEN};

/// Brightness applied at startup, in percent
pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// How an inbound frame is treated before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameDisposition {
    /// Addressed to this screen with a valid checksum
    Accept,
    /// Addressed to another screen; ignored silently
    ForeignScreen,
    /// Checksum mismatch; answered with PROTOCOL_ERROR
    ChecksumMismatch,
    /// A response frame echoed back by the peer; ignored
    PeerResponse,
}

/// Result of offering a frame to the command queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Decoded and queued; the reply follows once it is applied
    Queued,
    /// Not for us; nothing is sent
    Ignored,
    /// Rejected before queueing; send this reply
    Rejected(Reply),
    /// Queue full; the caller must drain before retrying
    Full(Command),
}

/// Per-screen command processor
#[derive(Debug, Clone)]
pub struct Controller {
    screen_id: u8,
    store: ElementStore,
    dedup: DedupCache,
    brightness: u8,
}

impl Controller {
    pub fn new(screen_id: u8, panel: &PanelConfig) -> Self {
        let (width, height) = panel.dimensions();
        info!("Screen {}: {}x{} panel", screen_id, width, height);
        Self {
            screen_id,
            store: ElementStore::new(width, height),
            dedup: DedupCache::new(),
            brightness: DEFAULT_BRIGHTNESS,
        }
    }

    pub fn screen_id(&self) -> u8 {
        self.screen_id
    }

    /// Classify a structurally valid frame
    ///
    /// The screen filter runs first, so corrupt frames for other screens
    /// never produce a response from this one.
    pub fn classify(&self, frame: &Frame) -> FrameDisposition {
        if frame.screen_id != self.screen_id {
            FrameDisposition::ForeignScreen
        } else if frame.command == lumawall_protocol::commands::CMD_RESPONSE {
            FrameDisposition::PeerResponse
        } else if !validate(frame) {
            FrameDisposition::ChecksumMismatch
        } else {
            FrameDisposition::Accept
        }
    }

    /// Validate, decode and enqueue one frame
    pub fn admit(&self, frame: &Frame, queue: &mut CommandQueue) -> Admission {
        match self.classify(frame) {
            FrameDisposition::ForeignScreen | FrameDisposition::PeerResponse => {
                debug!("Ignoring frame for screen {}", frame.screen_id);
                return Admission::Ignored;
            }
            FrameDisposition::ChecksumMismatch => {
                warn!("Checksum mismatch on command 0x{:02X}", frame.command);
                return Admission::Rejected(Reply::code(ResponseCode::ProtocolError));
            }
            FrameDisposition::Accept => {}
        }

        let command = match Command::decode(frame) {
            Ok(command) => command,
            Err(e) => {
                warn!("Rejected command 0x{:02X}: {}", frame.command, e);
                return Admission::Rejected(Reply::code(decode_error_code(&e)));
            }
        };

        match queue.push(command) {
            Ok(()) => Admission::Queued,
            Err(command) => Admission::Full(command),
        }
    }

    /// Apply one command and produce its reply
    pub fn apply<I, G>(&mut self, command: Command, images: &I, glyphs: &G, now_ms: u64) -> Reply
    where
        I: ImageSource + ?Sized,
        G: GlyphSource + ?Sized,
    {
        debug!("Applying {}", command.name());
        match command {
            Command::LoadGif(cmd) => self.apply_gif(&cmd, images, now_ms),
            Command::DisplayText(cmd) => self.apply_text(&cmd, glyphs, now_ms),
            Command::ClearScreen { .. } => {
                self.store.clear_all();
                self.dedup.clear();
                Reply::ok()
            }
            Command::ClearText { .. } => {
                let removed = self.store.clear_text_only();
                self.dedup.clear_kind(ElementKind::Text);
                debug!("Cleared {} text elements", removed);
                Reply::ok()
            }
            Command::DeleteElement { element_id, .. } => {
                self.dedup.forget(element_id);
                if self.store.delete(element_id) {
                    Reply::ok()
                } else {
                    warn!("Delete of unknown element {}", element_id);
                    Reply::code(ResponseCode::Error)
                }
            }
            Command::SetBrightness { value, .. } => {
                self.set_brightness(value);
                Reply::ok()
            }
            Command::GetStatus { .. } => Reply::with_data(ResponseCode::Ok, self.status().as_bytes()),
        }
    }

    fn apply_gif<I: ImageSource + ?Sized>(&mut self, cmd: &GifCommand, images: &I, now_ms: u64) -> Reply {
        let fingerprint = gif_fingerprint(cmd);
        if self.dedup.is_duplicate(ElementKind::Gif, cmd.element_id, fingerprint) {
            debug!("Element {} unchanged, skipping", cmd.element_id);
            return Reply::ok();
        }

        let rect = Rect::new(cmd.x, cmd.y, cmd.width, cmd.height);
        match self
            .store
            .upsert_gif(cmd.element_id, rect, &cmd.filename, images, now_ms)
        {
            Ok(()) => {
                self.dedup.record(ElementKind::Gif, cmd.element_id, fingerprint);
                Reply::ok()
            }
            Err(e) => {
                warn!("LoadGif {} for element {} failed: {}", cmd.filename.as_str(), cmd.element_id, e);
                Reply::code(store_error_code(e))
            }
        }
    }

    fn apply_text<G: GlyphSource + ?Sized>(&mut self, cmd: &TextCommand, glyphs: &G, now_ms: u64) -> Reply {
        let fingerprint = text_fingerprint(cmd);
        if self.dedup.is_duplicate(ElementKind::Text, cmd.element_id, fingerprint) {
            debug!("Element {} unchanged, skipping", cmd.element_id);
            return Reply::ok();
        }

        let rendered_width = glyphs.text_width(&cmd.font_name, &cmd.text, cmd.font_size);
        let height = glyphs.metrics(&cmd.font_name).line_height() * cmd.font_size as u16;
        let rect = Rect::new(cmd.x, cmd.y, rendered_width, height);
        let update = TextSpec {
            content: String::from(cmd.text.as_str()),
            font: String::from(cmd.font_name.as_str()),
            font_scale: cmd.font_size,
            color: ColorIndex::from_rgb(cmd.color),
            blink_interval_ms: cmd.blink_ms,
            rendered_width,
        };

        match self.store.upsert_text(cmd.element_id, rect, update, now_ms) {
            Ok(()) => {
                self.dedup.record(ElementKind::Text, cmd.element_id, fingerprint);
                Reply::ok()
            }
            Err(e) => {
                warn!("DisplayText for element {} failed: {}", cmd.element_id, e);
                Reply::code(store_error_code(e))
            }
        }
    }

    /// Set software brightness, clamped to 100 %
    pub fn set_brightness(&mut self, value: u8) {
        let value = value.min(100);
        if value != self.brightness {
            self.brightness = value;
            self.store.mark_dirty();
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Human-readable status line sent in GetStatus replies
    pub fn status(&self) -> heapless::String<REPLY_DATA_LEN> {
        let (width, height) = self.store.dimensions();
        let mut status = heapless::String::new();
        // Longest possible line is well under the capacity
        let _ = write!(
            status,
            "Screen {}: {}x{}, Elements: {}, Brightness: {}",
            self.screen_id,
            width,
            height,
            self.store.len(),
            self.brightness
        );
        status
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ElementStore {
        &mut self.store
    }
}

fn decode_error_code(error: &DecodeError) -> ResponseCode {
    match error {
        DecodeError::UnknownCommand(_) => ResponseCode::Error,
        _ => ResponseCode::InvalidParams,
    }
}

fn store_error_code(error: StoreError) -> ResponseCode {
    match error {
        StoreError::Bounds => ResponseCode::InvalidParams,
        StoreError::Source(_) => ResponseCode::FileNotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BuiltinFont;
    use crate::render::RenderPipeline;
    use crate::store::tests::SolidImages;
    use lumawall_display::{MemoryPanel, Rgb};
    use lumawall_protocol::commands::{CMD_CLEAR_SCREEN, CMD_LOAD_GIF};
    use lumawall_protocol::{FrameSynchronizer, SyncEvent};

    fn controller() -> Controller {
        Controller::new(1, &PanelConfig::default())
    }

    fn gif(element_id: u8, rect: (u16, u16, u16, u16), file: &str) -> Command {
        Command::LoadGif(GifCommand::new(1, element_id, rect, file).unwrap())
    }

    fn text(element_id: u8, x: u16, y: u16, content: &str) -> Command {
        Command::DisplayText(TextCommand::new(1, element_id, x, y, content).unwrap())
    }

    fn run(ctrl: &mut Controller, command: Command) -> Reply {
        ctrl.apply(command, &SolidImages, &BuiltinFont, 0)
    }

    #[test]
    fn test_duplicate_gif_applied_once() {
        let mut ctrl = controller();
        let before = ctrl.store().revision();

        assert!(run(&mut ctrl, gif(1, (0, 0, 32, 32), "a.gif")).is_ok());
        assert!(run(&mut ctrl, gif(1, (0, 0, 32, 32), "a.gif")).is_ok());

        assert_eq!(ctrl.store().revision(), before + 1);
        assert_eq!(ctrl.store().len(), 1);
    }

    #[test]
    fn test_changed_gif_reapplied() {
        let mut ctrl = controller();
        run(&mut ctrl, gif(1, (0, 0, 32, 32), "a.gif"));
        run(&mut ctrl, gif(1, (10, 0, 32, 32), "a.gif"));
        assert_eq!(ctrl.store().revision(), 2);
        assert_eq!(ctrl.store().get(1).unwrap().rect.x, 10);
    }

    #[test]
    fn test_duplicate_text_scenario() {
        let mut ctrl = controller();
        let first = run(&mut ctrl, text(5, 4, 4, "HELLO"));
        let revision = ctrl.store().revision();
        let second = run(&mut ctrl, text(5, 4, 4, "HELLO"));

        assert_eq!(first.code, ResponseCode::Ok);
        assert_eq!(second.code, ResponseCode::Ok);
        assert_eq!(ctrl.store().revision(), revision);
        assert_eq!(ctrl.store().len(), 1);
    }

    #[test]
    fn test_text_upsert_does_not_grow() {
        let mut ctrl = controller();
        run(&mut ctrl, text(5, 0, 0, "ONE"));
        for (i, word) in ["TWO", "THREE", "FOUR"].iter().enumerate() {
            run(&mut ctrl, text(5, i as u16, 0, word));
            assert_eq!(ctrl.store().len(), 1);
        }
        assert_eq!(ctrl.store().get(5).unwrap().as_text().unwrap().content, "FOUR");
    }

    #[test]
    fn test_gif_out_of_bounds() {
        let mut ctrl = controller();
        let before = ctrl.store().revision();
        let reply = run(&mut ctrl, gif(1, (180, 0, 20, 20), "a.gif"));

        assert_eq!(reply.code, ResponseCode::InvalidParams);
        assert!(ctrl.store().is_empty());
        assert_eq!(ctrl.store().revision(), before);
    }

    #[test]
    fn test_text_origin_out_of_bounds() {
        let mut ctrl = controller();
        let reply = run(&mut ctrl, text(2, 192, 0, "X"));
        assert_eq!(reply.code, ResponseCode::InvalidParams);
        assert!(ctrl.store().is_empty());
    }

    #[test]
    fn test_missing_image() {
        let mut ctrl = controller();
        let reply = run(&mut ctrl, gif(1, (0, 0, 8, 8), "missing.png"));
        assert_eq!(reply.code, ResponseCode::FileNotFound);
        assert!(ctrl.store().is_empty());
    }

    #[test]
    fn test_failed_load_is_retried() {
        // A rejected command leaves no fingerprint behind
        let mut ctrl = controller();
        run(&mut ctrl, gif(1, (180, 0, 20, 20), "a.gif"));
        let reply = run(&mut ctrl, gif(1, (180, 0, 20, 20), "a.gif"));
        assert_eq!(reply.code, ResponseCode::InvalidParams);
    }

    #[test]
    fn test_delete() {
        let mut ctrl = controller();
        run(&mut ctrl, text(3, 0, 0, "BYE"));

        let reply = run(
            &mut ctrl,
            Command::DeleteElement {
                screen_id: 1,
                element_id: 3,
            },
        );
        assert!(reply.is_ok());
        assert!(ctrl.store().is_empty());

        let reply = run(
            &mut ctrl,
            Command::DeleteElement {
                screen_id: 1,
                element_id: 3,
            },
        );
        assert_eq!(reply.code, ResponseCode::Error);

        // Fingerprint was forgotten, so the same text is applied again
        run(&mut ctrl, text(3, 0, 0, "BYE"));
        assert_eq!(ctrl.store().len(), 1);
    }

    #[test]
    fn test_clear_text_keeps_images() {
        let mut ctrl = controller();
        run(&mut ctrl, gif(1, (0, 0, 8, 8), "a.gif"));
        run(&mut ctrl, text(2, 0, 20, "A"));
        run(&mut ctrl, Command::ClearText { screen_id: 1 });

        assert_eq!(ctrl.store().len(), 1);
        assert_eq!(ctrl.store().get(1).unwrap().kind(), ElementKind::Gif);

        // Text dedup was reset; gif dedup still holds
        run(&mut ctrl, text(2, 0, 20, "A"));
        assert_eq!(ctrl.store().len(), 2);
        let revision = ctrl.store().revision();
        run(&mut ctrl, gif(1, (0, 0, 8, 8), "a.gif"));
        assert_eq!(ctrl.store().revision(), revision);
    }

    #[test]
    fn test_clear_resets_dedup() {
        let mut ctrl = controller();
        run(&mut ctrl, gif(1, (0, 0, 8, 8), "a.gif"));
        run(&mut ctrl, Command::ClearScreen { screen_id: 1 });
        assert!(ctrl.store().is_empty());

        run(&mut ctrl, gif(1, (0, 0, 8, 8), "a.gif"));
        assert_eq!(ctrl.store().len(), 1);
    }

    #[test]
    fn test_kind_switch_resets_other_fingerprint() {
        let mut ctrl = controller();
        run(&mut ctrl, gif(4, (0, 0, 8, 8), "a.gif"));
        run(&mut ctrl, text(4, 0, 0, "T"));
        assert_eq!(ctrl.store().get(4).unwrap().kind(), ElementKind::Text);

        // Same gif again must replace the text, not be skipped
        run(&mut ctrl, gif(4, (0, 0, 8, 8), "a.gif"));
        assert_eq!(ctrl.store().get(4).unwrap().kind(), ElementKind::Gif);
    }

    #[test]
    fn test_status_and_brightness() {
        let mut ctrl = controller();
        run(&mut ctrl, text(1, 0, 0, "A"));
        let reply = run(
            &mut ctrl,
            Command::SetBrightness {
                screen_id: 1,
                value: 40,
            },
        );
        assert!(reply.is_ok());
        assert!(ctrl.store().is_dirty());

        let reply = run(&mut ctrl, Command::GetStatus { screen_id: 1 });
        assert_eq!(&reply.data[..], b"Screen 1: 192x192, Elements: 1, Brightness: 40");
    }

    #[test]
    fn test_text_paints_over_gif() {
        let mut ctrl = controller();
        run(&mut ctrl, text(2, 0, 0, "I"));
        run(&mut ctrl, gif(1, (0, 0, 16, 16), "a.gif"));

        let mut panel = MemoryPanel::new(192, 192);
        let brightness = ctrl.brightness();
        RenderPipeline::new(true)
            .render(ctrl.store_mut(), brightness, &mut panel, &BuiltinFont)
            .unwrap();
        assert_eq!(panel.pixel(2, 3), Some(Rgb::WHITE));
    }

    #[test]
    fn test_classify() {
        let ctrl = controller();
        let mut frame = Frame::new(1, CMD_CLEAR_SCREEN, &[1, 3]).unwrap();
        assert_eq!(ctrl.classify(&frame), FrameDisposition::Accept);

        frame.checksum ^= 0xFF;
        assert_eq!(ctrl.classify(&frame), FrameDisposition::ChecksumMismatch);

        frame.screen_id = 2;
        assert_eq!(ctrl.classify(&frame), FrameDisposition::ForeignScreen);

        let response = lumawall_protocol::Response::new(1, ResponseCode::Ok)
            .to_frame()
            .unwrap();
        assert_eq!(ctrl.classify(&response), FrameDisposition::PeerResponse);
    }

    #[test]
    fn test_admit_rejections() {
        let ctrl = controller();
        let mut queue = CommandQueue::new();

        let mut corrupt = Frame::new(1, CMD_CLEAR_SCREEN, &[9]).unwrap();
        corrupt.checksum ^= 1;
        assert_eq!(
            ctrl.admit(&corrupt, &mut queue),
            Admission::Rejected(Reply::code(ResponseCode::ProtocolError))
        );

        let short = Frame::new(1, CMD_LOAD_GIF, &[1, 2, 3]).unwrap();
        assert_eq!(
            ctrl.admit(&short, &mut queue),
            Admission::Rejected(Reply::code(ResponseCode::InvalidParams))
        );

        let unknown = Frame::new(1, 0x42, &[]).unwrap();
        assert_eq!(
            ctrl.admit(&unknown, &mut queue),
            Admission::Rejected(Reply::code(ResponseCode::Error))
        );

        let foreign = Frame::new(7, CMD_CLEAR_SCREEN, &[]).unwrap();
        assert_eq!(ctrl.admit(&foreign, &mut queue), Admission::Ignored);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_frame_scenario() {
        let mut ctrl = controller();
        run(&mut ctrl, text(1, 0, 0, "OLD"));

        // ClearScreen frame whose payload is 0x45 bytes of padding
        let mut payload = [0u8; 0x45];
        payload[0] = 1;
        let frame = Frame::new(1, CMD_CLEAR_SCREEN, &payload).unwrap();
        let bytes = frame.encode_to_vec().unwrap();
        assert_eq!(&bytes[..7], &[0xAA, 0x55, 0xAA, 0x55, 0x01, 0x03, 0x45]);

        let mut sync = FrameSynchronizer::new();
        sync.feed(&bytes);
        let SyncEvent::Frame(received) = sync.poll() else {
            panic!("expected a frame");
        };

        let mut queue = CommandQueue::new();
        assert_eq!(ctrl.admit(&received, &mut queue), Admission::Queued);
        let command = queue.pop_or_none().unwrap();
        let reply = ctrl.apply(command, &SolidImages, &BuiltinFont, 0);

        assert_eq!(reply.code, ResponseCode::Ok);
        assert!(ctrl.store().is_empty());
    }

    #[test]
    fn test_admit_full_queue_returns_command() {
        let ctrl = controller();
        let mut queue = CommandQueue::new();
        let frame = Frame::new(1, CMD_CLEAR_SCREEN, &[]).unwrap();
        while !queue.is_full() {
            assert_eq!(ctrl.admit(&frame, &mut queue), Admission::Queued);
        }
        assert_eq!(
            ctrl.admit(&frame, &mut queue),
            Admission::Full(Command::ClearScreen { screen_id: 1 })
        );
    }
}
