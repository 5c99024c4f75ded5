//! Configuration type definitions
//!
//! These types describe panel geometry and the tunable timing constants.
//! The host loads them from TOML; with the `serde` feature they derive
//! `Deserialize` and fall back to the defaults below for missing keys.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum pixel mapper name length
pub const MAX_MAPPER_LEN: usize = 16;

/// Pixel mapper that rotates the chain into vertical strips
pub const V_MAPPER: &str = "V-mapper";

/// Physical panel geometry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PanelConfig {
    /// Rows per panel module
    pub rows: u16,
    /// Columns per panel module
    pub cols: u16,
    /// Modules daisy-chained per output
    pub chain_length: u16,
    /// Parallel outputs
    pub parallel: u16,
    /// Optional pixel mapper name
    pub pixel_mapper: String<MAX_MAPPER_LEN>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            rows: 64,
            cols: 64,
            chain_length: 3,
            parallel: 3,
            pixel_mapper: String::new(),
        }
    }
}

impl PanelConfig {
    /// Visible (width, height) in pixels
    ///
    /// The V-mapper stacks chained modules vertically, swapping the axes.
    pub fn dimensions(&self) -> (u16, u16) {
        let width = self.cols.saturating_mul(self.chain_length);
        let height = self.rows.saturating_mul(self.parallel);
        if self.pixel_mapper.as_str() == V_MAPPER {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Animation and loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Main loop rate
    pub tick_hz: u16,
    /// Interval between one-pixel scroll steps
    pub scroll_interval_ms: u32,
    /// Frame delay used when an image reports none
    pub default_frame_delay_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: 30,
            scroll_interval_ms: 1000,
            default_frame_delay_ms: 100,
        }
    }
}

/// Peer restart detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Garbage burst size that counts as a possible peer restart
    pub garbage_restart_threshold: usize,
    /// Minimum gap between bursts for a new burst to count as a restart
    pub quiet_period_ms: u64,
    /// How long input is discarded after a restart
    pub grace_period_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            garbage_restart_threshold: 200,
            quiet_period_ms: 5000,
            grace_period_ms: 1500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        assert_eq!(PanelConfig::default().dimensions(), (192, 192));
    }

    #[test]
    fn test_v_mapper_swaps_axes() {
        let mut panel = PanelConfig {
            rows: 32,
            cols: 64,
            chain_length: 4,
            parallel: 1,
            pixel_mapper: String::new(),
        };
        assert_eq!(panel.dimensions(), (256, 32));

        panel.pixel_mapper = String::try_from(V_MAPPER).unwrap();
        assert_eq!(panel.dimensions(), (32, 256));
    }
}
