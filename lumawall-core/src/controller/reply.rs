//! Outbound responses

use heapless::Vec;
use log::warn;

use lumawall_protocol::{LinkWriter, Response, ResponseCode};

/// Capacity of reply data produced by the controller
pub const REPLY_DATA_LEN: usize = 64;

/// Outcome of applying one command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    pub code: ResponseCode,
    pub data: Vec<u8, REPLY_DATA_LEN>,
}

impl Reply {
    pub fn ok() -> Self {
        Self::code(ResponseCode::Ok)
    }

    pub fn code(code: ResponseCode) -> Self {
        Self {
            code,
            data: Vec::new(),
        }
    }

    pub fn with_data(code: ResponseCode, data: &[u8]) -> Self {
        let mut reply = Self::code(code);
        let len = data.len().min(REPLY_DATA_LEN);
        // Length clamped above
        let _ = reply.data.extend_from_slice(&data[..len]);
        reply
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::Ok
    }
}

/// Writes response frames to the link
///
/// A failed write is logged and counted. Responses are best effort; the
/// caller never stops processing because of one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEmitter {
    sent: u32,
    failed: u32,
}

impl ResponseEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a response; returns false if it could not be written
    pub fn send<W: LinkWriter + ?Sized>(
        &mut self,
        link: &mut W,
        screen_id: u8,
        code: ResponseCode,
        data: &[u8],
    ) -> bool {
        let encoded = match Response::with_data(screen_id, code, data)
            .to_frame()
            .and_then(|frame| frame.encode_to_vec())
        {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Cannot encode {} response: {}", code.name(), e);
                self.failed = self.failed.saturating_add(1);
                return false;
            }
        };

        let written = link.write_all(&encoded).and_then(|()| link.flush());
        match written {
            Ok(()) => {
                self.sent = self.sent.saturating_add(1);
                true
            }
            Err(e) => {
                warn!("Failed to send {} response: {:?}", code.name(), e);
                self.failed = self.failed.saturating_add(1);
                false
            }
        }
    }

    pub fn send_reply<W: LinkWriter + ?Sized>(&mut self, link: &mut W, screen_id: u8, reply: &Reply) -> bool {
        self.send(link, screen_id, reply.code, &reply.data)
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }
}
