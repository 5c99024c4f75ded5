//! Host configuration
//!
//! A single TOML file describes the screen: its id, panel geometry, serial
//! link, display options and the timing/link tunables from `lumawall-core`.
//! Every key is optional; missing keys take the defaults below.

pub mod loader;

use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use lumawall_core::config::{LinkConfig, PanelConfig, TimingConfig};

pub use loader::{load_config, parse_config, ConfigError};

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default link speed
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
        }
    }
}

/// Rendering and asset options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Draw the diagnostic pattern while no element is shown
    pub show_diagnostics: bool,
    /// Directory LoadGif file names are resolved against
    pub image_root: PathBuf,
    /// Directory scanned for `*.bdf` fonts at startup
    pub font_dir: PathBuf,
    /// Write every presented frame to this PPM file
    pub snapshot: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_diagnostics: true,
            image_root: PathBuf::from("."),
            font_dir: PathBuf::from("fonts"),
            snapshot: None,
        }
    }
}

/// Complete configuration of one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Screen id this controller answers to
    pub screen_id: u8,
    pub panel: PanelConfig,
    pub serial: SerialConfig,
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub link: LinkConfig,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            screen_id: 1,
            panel: PanelConfig::default(),
            serial: SerialConfig::default(),
            display: DisplayConfig::default(),
            timing: TimingConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl ScreenConfig {
    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.panel.dimensions();
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid("panel has no pixels"));
        }
        if self.timing.tick_hz == 0 {
            return Err(ConfigError::Invalid("timing.tick_hz must be positive"));
        }
        if self.serial.baudrate == 0 {
            return Err(ConfigError::Invalid("serial.baudrate must be positive"));
        }
        if self.serial.port.is_empty() {
            return Err(ConfigError::Invalid("serial.port is empty"));
        }
        Ok(())
    }

    /// Log the effective configuration
    pub fn log_summary(&self) {
        let (width, height) = self.panel.dimensions();
        info!("Screen ID: {}", self.screen_id);
        info!(
            "Panel: {}x{} modules, chain {}, parallel {} -> {}x{}{}",
            self.panel.cols,
            self.panel.rows,
            self.panel.chain_length,
            self.panel.parallel,
            width,
            height,
            if self.panel.pixel_mapper.is_empty() {
                String::new()
            } else {
                format!(" ({})", self.panel.pixel_mapper)
            }
        );
        info!("Serial: {} @ {} baud", self.serial.port, self.serial.baudrate);
        info!(
            "Diagnostics: {}, images: {}, fonts: {}",
            if self.display.show_diagnostics { "on" } else { "off" },
            self.display.image_root.display(),
            self.display.font_dir.display()
        );
        info!(
            "Timing: {} Hz, scroll {} ms, default frame delay {} ms",
            self.timing.tick_hz, self.timing.scroll_interval_ms, self.timing.default_frame_delay_ms
        );
    }
}
