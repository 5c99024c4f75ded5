//! Peer tool
//!
//! Plays the co-processor's role from the command line: encodes one command,
//! writes it to the link and waits for the wall's response.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Subcommand;
use log::debug;

use lumawall_protocol::commands::CMD_RESPONSE;
use lumawall_protocol::{Command, FrameSynchronizer, GifCommand, LinkWriter, Response, Rgb, SyncEvent, TextCommand};

use crate::serial::ByteLink;

/// Commands the peer tool can send
#[derive(Debug, Clone, Subcommand)]
pub enum SendAction {
    /// Show an image or animated GIF
    Gif {
        element: u8,
        file: String,
        #[arg(long, default_value_t = 0)]
        x: u16,
        #[arg(long, default_value_t = 0)]
        y: u16,
        #[arg(long, default_value_t = 64)]
        width: u16,
        #[arg(long, default_value_t = 64)]
        height: u16,
    },

    /// Show a line of text
    Text {
        element: u8,
        text: String,
        #[arg(long, default_value_t = 0)]
        x: u16,
        #[arg(long, default_value_t = 0)]
        y: u16,
        /// Integer glyph scale
        #[arg(long, default_value_t = 1)]
        scale: u8,
        /// Colour as RRGGBB hex
        #[arg(long, default_value = "FFFFFF")]
        color: String,
        /// BDF font name; built-in font when omitted
        #[arg(long, default_value = "")]
        font: String,
        /// Blink half-period in ms, 0 for steady text
        #[arg(long, default_value_t = 0)]
        blink: u16,
    },

    /// Remove every element
    Clear,

    /// Remove text elements only
    ClearText,

    /// Remove one element
    Delete { element: u8 },

    /// Set brightness in percent
    Brightness { value: u8 },

    /// Query the screen status line
    Status,
}

impl SendAction {
    /// Build the wire command for `screen_id`
    pub fn to_command(&self, screen_id: u8) -> Result<Command> {
        let command = match self {
            SendAction::Gif {
                element,
                file,
                x,
                y,
                width,
                height,
            } => {
                let gif = GifCommand::new(screen_id, *element, (*x, *y, *width, *height), file)
                    .map_err(|e| anyhow!("invalid gif command: {}", e))?;
                Command::LoadGif(gif)
            }
            SendAction::Text {
                element,
                text,
                x,
                y,
                scale,
                color,
                font,
                blink,
            } => {
                let cmd = TextCommand::new(screen_id, *element, *x, *y, text)
                    .and_then(|cmd| cmd.with_font(font))
                    .map_err(|e| anyhow!("invalid text command: {}", e))?
                    .with_color(parse_color(color)?)
                    .with_scale(*scale)
                    .with_blink(*blink);
                Command::DisplayText(cmd)
            }
            SendAction::Clear => Command::ClearScreen { screen_id },
            SendAction::ClearText => Command::ClearText { screen_id },
            SendAction::Delete { element } => Command::DeleteElement {
                screen_id,
                element_id: *element,
            },
            SendAction::Brightness { value } => {
                if *value > 100 {
                    bail!("brightness must be 0-100, got {}", value);
                }
                Command::SetBrightness {
                    screen_id,
                    value: *value,
                }
            }
            SendAction::Status => Command::GetStatus { screen_id },
        };
        Ok(command)
    }
}

/// Parse `RRGGBB`, with or without a leading `#`
pub fn parse_color(text: &str) -> Result<Rgb> {
    let hex = text.trim_start_matches('#');
    if hex.len() != 6 {
        bail!("colour must be RRGGBB, got {:?}", text);
    }
    let value = u32::from_str_radix(hex, 16).with_context(|| format!("invalid colour {:?}", text))?;
    Ok(Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

/// Write `command` and wait up to `timeout` for its response
///
/// Frames that are not responses for the command's screen are skipped.
pub fn send_command<L: ByteLink>(link: &mut L, command: &Command, timeout: Duration) -> Result<Response> {
    let frame = command
        .to_frame()
        .and_then(|frame| frame.encode_to_vec())
        .map_err(|e| anyhow!("cannot encode {}: {}", command.name(), e))?;

    link.write_all(&frame)
        .and_then(|()| link.flush())
        .map_err(|e| anyhow!("failed to write {}: {:?}", command.name(), e))?;
    debug!("Sent {} ({} bytes)", command.name(), frame.len());

    let screen_id = command.screen_id();
    let mut sync = FrameSynchronizer::new();
    let mut buffer = [0u8; 256];
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let n = link
            .read_available(&mut buffer)
            .map_err(|e| anyhow!("link read failed: {:?}", e))?;
        if n == 0 {
            std::thread::sleep(Duration::from_millis(5));
            continue;
        }
        sync.feed(&buffer[..n]);

        loop {
            match sync.poll() {
                SyncEvent::Incomplete => break,
                SyncEvent::Garbage(len) => debug!("Skipped {} bytes", len),
                SyncEvent::Frame(frame) if frame.command == CMD_RESPONSE && frame.screen_id == screen_id => {
                    return Response::from_frame(&frame).map_err(|e| anyhow!("malformed response: {}", e));
                }
                SyncEvent::Frame(frame) => debug!("Ignoring frame 0x{:02X}", frame.command),
            }
        }
    }

    bail!("no response from screen {} within {:?}", screen_id, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("FF8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(parse_color("#00ff00").unwrap(), Rgb::GREEN);
        assert!(parse_color("FFF").is_err());
        assert!(parse_color("GG0000").is_err());
    }

    #[test]
    fn test_text_action() {
        let action = SendAction::Text {
            element: 5,
            text: "HI".to_string(),
            x: 10,
            y: 20,
            scale: 2,
            color: "FF0000".to_string(),
            font: String::new(),
            blink: 500,
        };
        let Command::DisplayText(cmd) = action.to_command(1).unwrap() else {
            panic!("expected DisplayText");
        };
        assert_eq!((cmd.element_id, cmd.x, cmd.y), (5, 10, 20));
        assert_eq!(cmd.color, Rgb::RED);
        assert_eq!((cmd.font_size, cmd.blink_ms), (2, 500));
    }

    #[test]
    fn test_invalid_actions() {
        assert!(SendAction::Brightness { value: 101 }.to_command(1).is_err());
        let gif = SendAction::Gif {
            element: 1,
            file: String::new(),
            x: 0,
            y: 0,
            width: 8,
            height: 8,
        };
        assert!(gif.to_command(1).is_err());
    }

    #[test]
    fn test_simple_actions() {
        assert_eq!(
            SendAction::Delete { element: 3 }.to_command(2).unwrap(),
            Command::DeleteElement {
                screen_id: 2,
                element_id: 3
            }
        );
        assert_eq!(
            SendAction::Status.to_command(1).unwrap(),
            Command::GetStatus { screen_id: 1 }
        );
    }
}
