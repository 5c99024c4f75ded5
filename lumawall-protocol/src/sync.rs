//! Frame synchronizer
//!
//! Turns an unreliable byte stream into structurally delimited frames. The
//! synchronizer owns the receive buffer: bytes are appended with
//! [`FrameSynchronizer::feed`] and frames are pulled with
//! [`FrameSynchronizer::poll`] until it reports [`SyncEvent::Incomplete`].
//!
//! Checksums are not verified here; see [`crate::frame::validate`].

use heapless::Vec;

use crate::frame::{frame_len, Frame, END_MARKER, HEADER_LEN, SYNC_SEQUENCE};

/// Receive buffer capacity
pub const RX_BUFFER_SIZE: usize = 2048;

/// Result of appending bytes to the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedStatus {
    /// All bytes buffered
    Accepted,
    /// The buffer filled up and its oldest half was discarded
    Overflow { trimmed: usize },
}

/// Outcome of one extraction step
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncEvent {
    /// A complete frame was removed from the buffer
    Frame(Frame),
    /// Unsynchronized bytes were dropped
    Garbage(usize),
    /// Nothing more can be extracted until more bytes arrive
    Incomplete,
}

/// Running counters for link diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncStats {
    pub frames: u32,
    pub garbage_bytes: u32,
    pub false_starts: u32,
    pub overflow_bytes: u32,
}

/// Resynchronizing frame extractor
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    buffer: Vec<u8, RX_BUFFER_SIZE>,
    stats: SyncStats,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            stats: SyncStats::default(),
        }
    }

    /// Append received bytes
    ///
    /// When the buffer would overflow, the oldest half of its contents is
    /// dropped first. Input larger than the buffer is consumed in chunks so
    /// the most recent bytes always survive.
    pub fn feed(&mut self, bytes: &[u8]) -> FeedStatus {
        let mut trimmed = 0;

        for chunk in bytes.chunks(RX_BUFFER_SIZE / 2) {
            if self.buffer.len() + chunk.len() > RX_BUFFER_SIZE {
                let half = self.buffer.len() / 2;
                self.discard_front(half);
                trimmed += half;
            }
            // At most half the capacity is in use after trimming, so the
            // chunk always fits
            let _ = self.buffer.extend_from_slice(chunk);
        }

        if trimmed > 0 {
            self.stats.overflow_bytes = self.stats.overflow_bytes.saturating_add(trimmed as u32);
            FeedStatus::Overflow { trimmed }
        } else {
            FeedStatus::Accepted
        }
    }

    /// Try to extract the next frame
    ///
    /// Call repeatedly until `Incomplete` is returned. Every `Garbage`
    /// event should be reported to the link recovery monitor.
    pub fn poll(&mut self) -> SyncEvent {
        let keep = SYNC_SEQUENCE.len() - 1;

        let start = match find_sync(&self.buffer) {
            Some(start) => start,
            None => {
                // The tail may hold the beginning of a split sequence
                if self.buffer.len() > keep {
                    let dropped = self.buffer.len() - keep;
                    return self.garbage(dropped);
                }
                return SyncEvent::Incomplete;
            }
        };

        if start > 0 {
            return self.garbage(start);
        }

        if self.buffer.len() < HEADER_LEN {
            return SyncEvent::Incomplete;
        }

        let payload_len = self.buffer[6] as usize;
        let total = frame_len(payload_len);
        if self.buffer.len() < total {
            return SyncEvent::Incomplete;
        }

        if self.buffer[total - 1] != END_MARKER {
            // False preamble: step over one byte so a real frame starting
            // inside this candidate is not lost
            self.stats.false_starts = self.stats.false_starts.saturating_add(1);
            return self.garbage(1);
        }

        let mut payload = Vec::new();
        // payload_len is a u8, so it always fits MAX_PAYLOAD_SIZE
        let _ = payload.extend_from_slice(&self.buffer[HEADER_LEN..HEADER_LEN + payload_len]);
        let frame = Frame {
            screen_id: self.buffer[4],
            command: self.buffer[5],
            payload,
            checksum: self.buffer[total - 2],
        };

        self.discard_front(total);
        self.stats.frames = self.stats.frames.saturating_add(1);
        SyncEvent::Frame(frame)
    }

    /// Drop everything buffered (used after a peer restart)
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    fn garbage(&mut self, count: usize) -> SyncEvent {
        self.discard_front(count);
        self.stats.garbage_bytes = self.stats.garbage_bytes.saturating_add(count as u32);
        SyncEvent::Garbage(count)
    }

    fn discard_front(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        self.buffer.rotate_left(count);
        let remaining = self.buffer.len() - count;
        self.buffer.truncate(remaining);
    }
}

fn find_sync(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(SYNC_SEQUENCE.len())
        .position(|window| *window == SYNC_SEQUENCE)
}
