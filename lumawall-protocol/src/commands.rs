//! Command types and the payload decoder
//!
//! Every inbound command is turned into a [`Command`] by [`Command::decode`],
//! which checks lengths and field ranges before anything is constructed. A
//! decode failure never yields a partially populated command.
//!
//! Payload layouts (little-endian):
//!
//! | Command        | Layout                                                     | Bytes |
//! |----------------|------------------------------------------------------------|-------|
//! | LoadGif        | screen, element, x, y, w, h (u16), filename\[64\]          | 74    |
//! | LoadGif legacy | same, filename\[60\]                                       | 70    |
//! | DisplayText    | x, y (u16), size, r, g, b, len, text\[32\], font\[32\], element, blink (u16) | 76 |
//! | DeleteElement  | element                                                    | 1     |
//! | SetBrightness  | value (0-100)                                              | 1     |
//! | ClearScreen, ClearText, GetStatus | ignored                                 | any   |

use heapless::String;
use log::debug;

use crate::codec::{put_padded, put_u16_le, put_u8, PayloadBuf, Reader};
use crate::color::Rgb;
use crate::frame::{Frame, FrameError};

// Command codes
pub const CMD_LOAD_GIF: u8 = 0x01;
pub const CMD_DISPLAY_TEXT: u8 = 0x02;
pub const CMD_CLEAR_SCREEN: u8 = 0x03;
pub const CMD_SET_BRIGHTNESS: u8 = 0x04;
pub const CMD_GET_STATUS: u8 = 0x05;
pub const CMD_CLEAR_TEXT: u8 = 0x06;
pub const CMD_DELETE_ELEMENT: u8 = 0x07;
pub const CMD_RESPONSE: u8 = 0x80;

/// Maximum text length in bytes
pub const MAX_TEXT_LEN: usize = 32;

/// Width of the font name field
pub const FONT_NAME_LEN: usize = 32;

/// Width of the canonical filename field
pub const FILENAME_LEN: usize = 64;

/// Width of the legacy filename field
pub const LEGACY_FILENAME_LEN: usize = 60;

/// Largest accepted text scale factor
pub const MAX_FONT_SCALE: u8 = 8;

/// Brightness is a percentage
pub const MAX_BRIGHTNESS: u8 = 100;

/// Canonical LoadGif payload size
pub const GIF_PAYLOAD_LEN: usize = 2 + 8 + FILENAME_LEN;

/// Legacy LoadGif payload size
pub const LEGACY_GIF_PAYLOAD_LEN: usize = 2 + 8 + LEGACY_FILENAME_LEN;

/// DisplayText payload size
pub const TEXT_PAYLOAD_LEN: usize = 4 + 1 + 3 + 1 + MAX_TEXT_LEN + FONT_NAME_LEN + 1 + 2;

/// Reasons a validated frame could not be turned into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload shorter than the command's minimum size
    TooShort { expected: usize, actual: usize },
    /// Command code not recognised
    UnknownCommand(u8),
    /// A field is out of its allowed range
    InvalidField(&'static str),
    /// A text field is not valid UTF-8
    InvalidUtf8,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::TooShort { expected, actual } => {
                write!(f, "payload too short: {} < {}", actual, expected)
            }
            DecodeError::UnknownCommand(code) => write!(f, "unknown command 0x{:02X}", code),
            DecodeError::InvalidField(name) => write!(f, "invalid field `{}`", name),
            DecodeError::InvalidUtf8 => write!(f, "text is not valid UTF-8"),
        }
    }
}

/// LoadGif payload variant, chosen by payload length alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GifLayout {
    /// 64-byte filename field
    #[default]
    Canonical,
    /// 60-byte filename field sent by older co-processor firmware
    Legacy,
}

impl GifLayout {
    /// Layout used for a payload of `len` bytes; None when too short for either
    pub fn from_payload_len(len: usize) -> Option<Self> {
        if len >= GIF_PAYLOAD_LEN {
            Some(GifLayout::Canonical)
        } else if len >= LEGACY_GIF_PAYLOAD_LEN {
            Some(GifLayout::Legacy)
        } else {
            None
        }
    }

    /// Exact payload length of this layout
    pub fn payload_len(self) -> usize {
        match self {
            GifLayout::Canonical => GIF_PAYLOAD_LEN,
            GifLayout::Legacy => LEGACY_GIF_PAYLOAD_LEN,
        }
    }

    fn filename_len(self) -> usize {
        match self {
            GifLayout::Canonical => FILENAME_LEN,
            GifLayout::Legacy => LEGACY_FILENAME_LEN,
        }
    }
}

/// Place an animated image on the wall
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GifCommand {
    pub screen_id: u8,
    pub element_id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub filename: String<FILENAME_LEN>,
    /// Wire layout the command arrived in (or will be sent in)
    pub layout: GifLayout,
}

impl GifCommand {
    /// Build a canonical LoadGif command
    pub fn new(
        screen_id: u8,
        element_id: u8,
        (x, y, width, height): (u16, u16, u16, u16),
        filename: &str,
    ) -> Result<Self, DecodeError> {
        let cmd = Self {
            screen_id,
            element_id,
            x,
            y,
            width,
            height,
            filename: String::try_from(filename).map_err(|_| DecodeError::InvalidField("filename"))?,
            layout: GifLayout::Canonical,
        };
        cmd.check()?;
        Ok(cmd)
    }

    fn check(&self) -> Result<(), DecodeError> {
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::InvalidField("size"));
        }
        if self.filename.is_empty() || self.filename.len() > self.layout.filename_len() {
            return Err(DecodeError::InvalidField("filename"));
        }
        Ok(())
    }

    fn decode(screen_id: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        let layout = GifLayout::from_payload_len(payload.len()).ok_or(DecodeError::TooShort {
            expected: LEGACY_GIF_PAYLOAD_LEN,
            actual: payload.len(),
        })?;
        if payload.len() != layout.payload_len() {
            // Trailing bytes are ignored; a misframed sender shows up here
            debug!(
                "LoadGif payload is {} bytes, decoding as {:?} ({} bytes)",
                payload.len(),
                layout,
                layout.payload_len()
            );
        }

        let mut reader = Reader::new(payload);
        // Leading byte echoes the screen id; the frame header is authoritative
        let _ = reader.u8()?;
        let element_id = reader.u8()?;
        let x = reader.u16_le()?;
        let y = reader.u16_le()?;
        let width = reader.u16_le()?;
        let height = reader.u16_le()?;
        let filename = reader.padded_str(layout.filename_len())?;

        let cmd = Self {
            screen_id,
            element_id,
            x,
            y,
            width,
            height,
            filename: String::try_from(filename).map_err(|_| DecodeError::InvalidField("filename"))?,
            layout,
        };
        cmd.check()?;
        Ok(cmd)
    }

    fn encode(&self, buf: &mut PayloadBuf) -> Result<(), FrameError> {
        put_u8(buf, self.screen_id)?;
        put_u8(buf, self.element_id)?;
        put_u16_le(buf, self.x)?;
        put_u16_le(buf, self.y)?;
        put_u16_le(buf, self.width)?;
        put_u16_le(buf, self.height)?;
        put_padded(buf, self.filename.as_bytes(), self.layout.filename_len())
    }
}

/// Place or update a line of text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextCommand {
    pub screen_id: u8,
    pub element_id: u8,
    pub x: u16,
    pub y: u16,
    /// Integer glyph scale, 1..=MAX_FONT_SCALE
    pub font_size: u8,
    pub color: Rgb,
    pub text: String<MAX_TEXT_LEN>,
    /// Font file name; empty selects the built-in font
    pub font_name: String<FONT_NAME_LEN>,
    /// Blink half-period in milliseconds, 0 disables blinking
    pub blink_ms: u16,
}

impl TextCommand {
    /// Build a DisplayText command with white, unscaled, non-blinking text
    pub fn new(screen_id: u8, element_id: u8, x: u16, y: u16, text: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            screen_id,
            element_id,
            x,
            y,
            font_size: 1,
            color: Rgb::WHITE,
            text: String::try_from(text).map_err(|_| DecodeError::InvalidField("text_len"))?,
            font_name: String::new(),
            blink_ms: 0,
        })
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_scale(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_blink(mut self, blink_ms: u16) -> Self {
        self.blink_ms = blink_ms;
        self
    }

    pub fn with_font(mut self, font_name: &str) -> Result<Self, DecodeError> {
        self.font_name =
            String::try_from(font_name).map_err(|_| DecodeError::InvalidField("font_name"))?;
        Ok(self)
    }

    fn decode(screen_id: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < TEXT_PAYLOAD_LEN {
            return Err(DecodeError::TooShort {
                expected: TEXT_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }

        let mut reader = Reader::new(payload);
        let x = reader.u16_le()?;
        let y = reader.u16_le()?;
        let font_size = reader.u8()?;
        let color = Rgb::new(reader.u8()?, reader.u8()?, reader.u8()?);
        let text_len = reader.u8()? as usize;
        let text_field = reader.bytes(MAX_TEXT_LEN)?;
        let font_name = reader.padded_str(FONT_NAME_LEN)?;
        let element_id = reader.u8()?;
        let blink_ms = reader.u16_le()?;

        if font_size == 0 || font_size > MAX_FONT_SCALE {
            return Err(DecodeError::InvalidField("font_size"));
        }
        if text_len > MAX_TEXT_LEN {
            return Err(DecodeError::InvalidField("text_len"));
        }

        let raw = &text_field[..text_len];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(text_len);
        let text = core::str::from_utf8(&raw[..end]).map_err(|_| DecodeError::InvalidUtf8)?;

        Ok(Self {
            screen_id,
            element_id,
            x,
            y,
            font_size,
            color,
            text: String::try_from(text).map_err(|_| DecodeError::InvalidField("text_len"))?,
            font_name: String::try_from(font_name)
                .map_err(|_| DecodeError::InvalidField("font_name"))?,
            blink_ms,
        })
    }

    fn encode(&self, buf: &mut PayloadBuf) -> Result<(), FrameError> {
        put_u16_le(buf, self.x)?;
        put_u16_le(buf, self.y)?;
        put_u8(buf, self.font_size)?;
        put_u8(buf, self.color.r)?;
        put_u8(buf, self.color.g)?;
        put_u8(buf, self.color.b)?;
        put_u8(buf, self.text.len() as u8)?;
        put_padded(buf, self.text.as_bytes(), MAX_TEXT_LEN)?;
        put_padded(buf, self.font_name.as_bytes(), FONT_NAME_LEN)?;
        put_u8(buf, self.element_id)?;
        put_u16_le(buf, self.blink_ms)
    }
}

/// A decoded command addressed to one screen
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    LoadGif(GifCommand),
    DisplayText(TextCommand),
    ClearScreen { screen_id: u8 },
    ClearText { screen_id: u8 },
    DeleteElement { screen_id: u8, element_id: u8 },
    SetBrightness { screen_id: u8, value: u8 },
    GetStatus { screen_id: u8 },
}

impl Command {
    /// Decode a validated frame into a command
    pub fn decode(frame: &Frame) -> Result<Self, DecodeError> {
        let screen_id = frame.screen_id;
        let payload = &frame.payload[..];

        match frame.command {
            CMD_LOAD_GIF => GifCommand::decode(screen_id, payload).map(Command::LoadGif),
            CMD_DISPLAY_TEXT => TextCommand::decode(screen_id, payload).map(Command::DisplayText),
            CMD_CLEAR_SCREEN => Ok(Command::ClearScreen { screen_id }),
            CMD_CLEAR_TEXT => Ok(Command::ClearText { screen_id }),
            CMD_GET_STATUS => Ok(Command::GetStatus { screen_id }),
            CMD_DELETE_ELEMENT => {
                let element_id = Reader::new(payload).u8()?;
                Ok(Command::DeleteElement {
                    screen_id,
                    element_id,
                })
            }
            CMD_SET_BRIGHTNESS => {
                let value = Reader::new(payload).u8()?;
                if value > MAX_BRIGHTNESS {
                    return Err(DecodeError::InvalidField("brightness"));
                }
                Ok(Command::SetBrightness { screen_id, value })
            }
            other => Err(DecodeError::UnknownCommand(other)),
        }
    }

    /// Encode this command into a frame (peer side and tests)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut payload = PayloadBuf::new();
        match self {
            Command::LoadGif(gif) => gif.encode(&mut payload)?,
            Command::DisplayText(text) => text.encode(&mut payload)?,
            Command::DeleteElement { element_id, .. } => put_u8(&mut payload, *element_id)?,
            Command::SetBrightness { value, .. } => put_u8(&mut payload, *value)?,
            Command::ClearScreen { .. } | Command::ClearText { .. } | Command::GetStatus { .. } => {}
        }
        Frame::new(self.screen_id(), self.code(), &payload)
    }

    /// Screen this command is addressed to
    pub fn screen_id(&self) -> u8 {
        match self {
            Command::LoadGif(gif) => gif.screen_id,
            Command::DisplayText(text) => text.screen_id,
            Command::ClearScreen { screen_id }
            | Command::ClearText { screen_id }
            | Command::DeleteElement { screen_id, .. }
            | Command::SetBrightness { screen_id, .. }
            | Command::GetStatus { screen_id } => *screen_id,
        }
    }

    /// Element targeted by this command, if any
    pub fn element_id(&self) -> Option<u8> {
        match self {
            Command::LoadGif(gif) => Some(gif.element_id),
            Command::DisplayText(text) => Some(text.element_id),
            Command::DeleteElement { element_id, .. } => Some(*element_id),
            _ => None,
        }
    }

    /// Wire command code
    pub fn code(&self) -> u8 {
        match self {
            Command::LoadGif(_) => CMD_LOAD_GIF,
            Command::DisplayText(_) => CMD_DISPLAY_TEXT,
            Command::ClearScreen { .. } => CMD_CLEAR_SCREEN,
            Command::ClearText { .. } => CMD_CLEAR_TEXT,
            Command::DeleteElement { .. } => CMD_DELETE_ELEMENT,
            Command::SetBrightness { .. } => CMD_SET_BRIGHTNESS,
            Command::GetStatus { .. } => CMD_GET_STATUS,
        }
    }

    /// Short name for log output
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadGif(_) => "LoadGif",
            Command::DisplayText(_) => "DisplayText",
            Command::ClearScreen { .. } => "ClearScreen",
            Command::ClearText { .. } => "ClearText",
            Command::DeleteElement { .. } => "DeleteElement",
            Command::SetBrightness { .. } => "SetBrightness",
            Command::GetStatus { .. } => "GetStatus",
        }
    }
}
