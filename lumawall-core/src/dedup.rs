//! Retransmission filter
//!
//! The co-processor resends commands it is unsure about. Each applied
//! LoadGif/DisplayText command leaves a CRC-32 fingerprint per element id;
//! an identical command arriving later is acknowledged without touching the
//! store, so images are not re-decoded and animations do not restart.

use crc::{Crc, CRC_32_ISO_HDLC};
use lumawall_protocol::{GifCommand, TextCommand};

use crate::element::ElementKind;

const FINGERPRINT: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Fingerprint of a LoadGif command, excluding screen id and wire layout
pub fn gif_fingerprint(cmd: &GifCommand) -> u32 {
    let mut digest = FINGERPRINT.digest();
    digest.update(&[cmd.element_id]);
    digest.update(&cmd.x.to_le_bytes());
    digest.update(&cmd.y.to_le_bytes());
    digest.update(&cmd.width.to_le_bytes());
    digest.update(&cmd.height.to_le_bytes());
    digest.update(cmd.filename.as_bytes());
    digest.finalize()
}

/// Fingerprint of a DisplayText command, excluding screen id
pub fn text_fingerprint(cmd: &TextCommand) -> u32 {
    let mut digest = FINGERPRINT.digest();
    digest.update(&[cmd.element_id]);
    digest.update(&cmd.x.to_le_bytes());
    digest.update(&cmd.y.to_le_bytes());
    digest.update(&[cmd.font_size, cmd.color.r, cmd.color.g, cmd.color.b]);
    digest.update(&[cmd.text.len() as u8]);
    digest.update(cmd.text.as_bytes());
    digest.update(&[cmd.font_name.len() as u8]);
    digest.update(cmd.font_name.as_bytes());
    digest.update(&cmd.blink_ms.to_le_bytes());
    digest.finalize()
}

/// Last applied fingerprint per element id, one table per element kind
#[derive(Debug, Clone)]
pub struct DedupCache {
    gif: [Option<u32>; 256],
    text: [Option<u32>; 256],
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupCache {
    pub fn new() -> Self {
        Self {
            gif: [None; 256],
            text: [None; 256],
        }
    }

    /// Whether `checksum` matches the last command applied to `element_id`
    pub fn is_duplicate(&self, kind: ElementKind, element_id: u8, checksum: u32) -> bool {
        self.table(kind)[element_id as usize] == Some(checksum)
    }

    /// Remember an applied command
    ///
    /// The id's entry in the other table is dropped, since the element now
    /// has this kind.
    pub fn record(&mut self, kind: ElementKind, element_id: u8, checksum: u32) {
        self.table_mut(kind)[element_id as usize] = Some(checksum);
        self.table_mut(kind.other())[element_id as usize] = None;
    }

    /// Forget both entries for an element id
    pub fn forget(&mut self, element_id: u8) {
        self.gif[element_id as usize] = None;
        self.text[element_id as usize] = None;
    }

    /// Forget every entry of one kind
    pub fn clear_kind(&mut self, kind: ElementKind) {
        self.table_mut(kind).fill(None);
    }

    pub fn clear(&mut self) {
        self.gif.fill(None);
        self.text.fill(None);
    }

    fn table(&self, kind: ElementKind) -> &[Option<u32>; 256] {
        match kind {
            ElementKind::Gif => &self.gif,
            ElementKind::Text => &self.text,
        }
    }

    fn table_mut(&mut self, kind: ElementKind) -> &mut [Option<u32>; 256] {
        match kind {
            ElementKind::Gif => &mut self.gif,
            ElementKind::Text => &mut self.text,
        }
    }
}
