//! Lumawall host
//!
//! Runs one screen of the wall on Linux. The co-processor streams framed
//! commands over a serial link; this crate wires the `lumawall-core`
//! controller to that link, to the file system (images and fonts) and to a
//! panel, and drives everything from a fixed-rate loop.
//!
//! # Modules
//!
//! - `config`: TOML screen configuration
//! - `serial`: serial port link and the `ByteLink` seam
//! - `images`: GIF/still image loading under a confined root
//! - `fonts`: BDF fonts with the built-in font as fallback
//! - `panel`: headless panel with PPM snapshots
//! - `tick`: monotonic clock and loop pacing
//! - `runtime`: the main loop
//! - `send`: peer tool sending single commands

pub mod config;
pub mod fonts;
pub mod images;
pub mod panel;
pub mod runtime;
pub mod send;
pub mod serial;
pub mod tick;

pub use config::{load_config, ConfigError, ScreenConfig};
pub use fonts::FontLibrary;
pub use images::ImageLibrary;
pub use panel::HeadlessPanel;
pub use runtime::Runtime;
pub use serial::{ByteLink, SerialError, SerialLink};
