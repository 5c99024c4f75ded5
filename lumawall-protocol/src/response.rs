//! Acknowledgement frames sent back to the co-processor
//!
//! A response uses the normal framing with command [`CMD_RESPONSE`] and a
//! payload of `[code][data_len][data...]`.

use heapless::Vec;

use crate::codec::{put_u8, PayloadBuf, Reader};
use crate::commands::{DecodeError, CMD_RESPONSE};
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

/// Maximum response data length (payload minus code and length bytes)
pub const MAX_RESPONSE_DATA: usize = MAX_PAYLOAD_SIZE - 2;

/// Outcome reported for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0x00,
    Error = 0x01,
    FileNotFound = 0x02,
    InvalidParams = 0x03,
    ProtocolError = 0x04,
}

impl ResponseCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ResponseCode::Ok),
            0x01 => Some(ResponseCode::Error),
            0x02 => Some(ResponseCode::FileNotFound),
            0x03 => Some(ResponseCode::InvalidParams),
            0x04 => Some(ResponseCode::ProtocolError),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ResponseCode::Ok => "OK",
            ResponseCode::Error => "ERROR",
            ResponseCode::FileNotFound => "FILE_NOT_FOUND",
            ResponseCode::InvalidParams => "INVALID_PARAMS",
            ResponseCode::ProtocolError => "PROTOCOL_ERROR",
        }
    }
}

/// A response addressed to one screen
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub screen_id: u8,
    pub code: ResponseCode,
    pub data: Vec<u8, MAX_RESPONSE_DATA>,
}

impl Response {
    /// Response without data
    pub fn new(screen_id: u8, code: ResponseCode) -> Self {
        Self {
            screen_id,
            code,
            data: Vec::new(),
        }
    }

    /// Response carrying data, truncated to [`MAX_RESPONSE_DATA`]
    pub fn with_data(screen_id: u8, code: ResponseCode, data: &[u8]) -> Self {
        let len = data.len().min(MAX_RESPONSE_DATA);
        let mut response = Self::new(screen_id, code);
        // Length clamped above
        let _ = response.data.extend_from_slice(&data[..len]);
        response
    }

    /// Encode into a response frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut payload = PayloadBuf::new();
        put_u8(&mut payload, self.code.to_byte())?;
        put_u8(&mut payload, self.data.len() as u8)?;
        payload
            .extend_from_slice(&self.data)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Frame::new(self.screen_id, CMD_RESPONSE, &payload)
    }

    /// Parse a response frame (peer side)
    pub fn from_frame(frame: &Frame) -> Result<Self, DecodeError> {
        if frame.command != CMD_RESPONSE {
            return Err(DecodeError::UnknownCommand(frame.command));
        }
        let mut reader = Reader::new(&frame.payload);
        let code = ResponseCode::from_byte(reader.u8()?).ok_or(DecodeError::InvalidField("code"))?;
        let len = reader.u8()? as usize;
        let data = reader.bytes(len)?;
        Ok(Self::with_data(frame.screen_id, code, data))
    }

    /// Data interpreted as text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        core::str::from_utf8(&self.data).ok()
    }
}
