//! Frame encoding and checksum validation.
//!
//! Frame format:
//! - PREAMBLE (3 bytes): `AA 55 AA`
//! - START (1 byte): `55`
//! - SCREEN_ID (1 byte): target panel instance
//! - COMMAND (1 byte): command code
//! - PAYLOAD_LEN (1 byte): payload length (0-255)
//! - PAYLOAD (0-255 bytes): command-specific data
//! - CHECKSUM (1 byte): XOR of all PAYLOAD bytes
//! - END (1 byte): `AA`

use heapless::Vec;

/// Fixed synchronization preamble
pub const PREAMBLE: [u8; 3] = [0xAA, 0x55, 0xAA];

/// Start marker following the preamble
pub const START_MARKER: u8 = 0x55;

/// End marker closing every frame
pub const END_MARKER: u8 = 0xAA;

/// Preamble plus start marker, the sequence scanned for during resync
pub const SYNC_SEQUENCE: [u8; 4] = [PREAMBLE[0], PREAMBLE[1], PREAMBLE[2], START_MARKER];

/// Bytes before the payload (preamble + start + screen id + command + length)
pub const HEADER_LEN: usize = 7;

/// Bytes after the payload (checksum + end)
pub const TRAILER_LEN: usize = 2;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_PAYLOAD_SIZE + TRAILER_LEN;

/// Total encoded length of a frame carrying `payload_len` bytes
pub const fn frame_len(payload_len: usize) -> usize {
    HEADER_LEN + payload_len + TRAILER_LEN
}

/// Errors that can occur while building or encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::PayloadTooLarge => write!(f, "payload exceeds {} bytes", MAX_PAYLOAD_SIZE),
            FrameError::BufferTooSmall => write!(f, "output buffer too small"),
        }
    }
}

/// A framed unit as received from, or sent to, the link
///
/// `checksum` is the byte carried on the wire. Frames built locally via
/// [`Frame::new`] always carry a correct checksum; frames extracted by the
/// synchronizer carry whatever the peer sent and must go through
/// [`validate`] before their payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Target screen
    pub screen_id: u8,
    /// Command code
    pub command: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    /// Checksum byte as carried on the wire
    pub checksum: u8,
}

impl Frame {
    /// Create a new frame, computing its checksum
    pub fn new(screen_id: u8, command: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        let checksum = checksum(&payload);

        Ok(Self {
            screen_id,
            command,
            payload,
            checksum,
        })
    }

    /// Create a frame with no payload
    pub fn empty(screen_id: u8, command: u8) -> Self {
        Self {
            screen_id,
            command,
            payload: Vec::new(),
            checksum: 0,
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        frame_len(self.payload.len())
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let total = self.encoded_len();
        if buffer.len() < total {
            return Err(FrameError::BufferTooSmall);
        }

        let payload_end = HEADER_LEN + self.payload.len();

        buffer[..3].copy_from_slice(&PREAMBLE);
        buffer[3] = START_MARKER;
        buffer[4] = self.screen_id;
        buffer[5] = self.command;
        buffer[6] = self.payload.len() as u8;
        buffer[HEADER_LEN..payload_end].copy_from_slice(&self.payload);
        buffer[payload_end] = self.checksum;
        buffer[payload_end + 1] = END_MARKER;

        Ok(total)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// XOR of all payload bytes
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// Check a candidate frame's trailing checksum against its payload
pub fn validate(frame: &Frame) -> bool {
    checksum(&frame.payload) == frame.checksum
}
