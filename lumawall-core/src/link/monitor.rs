//! Link recovery monitor
//!
//! A rebooting co-processor spews boot noise onto the serial line. The
//! monitor watches garbage bursts reported by the frame synchronizer; a
//! large burst after a quiet period is treated as a peer restart, and input
//! is discarded for a grace period so the noise is never parsed as commands.
//!
//! All timestamps are milliseconds from a monotonic clock.

use log::{info, warn};

use crate::config::LinkConfig;

/// What the caller must do after reporting garbage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Nothing to do
    None,
    /// Peer restart detected: flush OS buffers and clear the receive buffer
    PeerRestart,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Restarts detected
    pub restarts: u32,
    /// Bytes thrown away during grace periods
    pub discarded_bytes: u64,
}

/// Peer restart detector
#[derive(Debug, Clone)]
pub struct LinkRecoveryMonitor {
    config: LinkConfig,
    /// Time of the last burst above the threshold
    last_burst_ms: Option<u64>,
    /// End of the current grace period
    grace_until_ms: Option<u64>,
    stats: LinkStats,
}

impl Default for LinkRecoveryMonitor {
    fn default() -> Self {
        Self::new(LinkConfig::default())
    }
}

impl LinkRecoveryMonitor {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            last_burst_ms: None,
            grace_until_ms: None,
            stats: LinkStats::default(),
        }
    }

    /// Report a garbage burst from the synchronizer
    pub fn on_garbage(&mut self, len: usize, now_ms: u64) -> LinkEvent {
        if len <= self.config.garbage_restart_threshold {
            return LinkEvent::None;
        }

        let quiet = match self.last_burst_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.config.quiet_period_ms,
        };
        self.last_burst_ms = Some(now_ms);

        if !quiet {
            return LinkEvent::None;
        }

        warn!(
            "Peer restart detected ({} garbage bytes), ignoring input for {} ms",
            len, self.config.grace_period_ms
        );
        self.grace_until_ms = Some(now_ms.saturating_add(self.config.grace_period_ms));
        self.stats.restarts = self.stats.restarts.saturating_add(1);
        LinkEvent::PeerRestart
    }

    /// Whether received bytes should be fed to the synchronizer
    ///
    /// Ends the grace period once it has elapsed.
    pub fn accepts_input(&mut self, now_ms: u64) -> bool {
        match self.grace_until_ms {
            Some(until) if now_ms < until => false,
            Some(_) => {
                info!("Link grace period over, resuming");
                self.grace_until_ms = None;
                true
            }
            None => true,
        }
    }

    /// Record bytes dropped while input was gated
    pub fn discard(&mut self, len: usize) {
        self.stats.discarded_bytes = self.stats.discarded_bytes.saturating_add(len as u64);
    }

    pub fn in_grace_period(&self) -> bool {
        self.grace_until_ms.is_some()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> LinkRecoveryMonitor {
        LinkRecoveryMonitor::new(LinkConfig {
            garbage_restart_threshold: 200,
            quiet_period_ms: 5000,
            grace_period_ms: 1000,
        })
    }

    #[test]
    fn test_small_garbage_ignored() {
        let mut monitor = monitor();
        assert_eq!(monitor.on_garbage(200, 10), LinkEvent::None);
        assert!(monitor.accepts_input(10));
    }

    #[test]
    fn test_first_burst_is_restart() {
        let mut monitor = monitor();
        assert_eq!(monitor.on_garbage(201, 100), LinkEvent::PeerRestart);
        assert!(monitor.in_grace_period());
        assert!(!monitor.accepts_input(100));
        assert!(!monitor.accepts_input(1099));
        assert!(monitor.accepts_input(1100));
        assert!(!monitor.in_grace_period());
        assert_eq!(monitor.stats().restarts, 1);
    }

    #[test]
    fn test_bursts_within_quiet_period() {
        let mut monitor = monitor();
        assert_eq!(monitor.on_garbage(500, 0), LinkEvent::PeerRestart);
        assert_eq!(monitor.on_garbage(500, 3000), LinkEvent::None);
        // Measured from the most recent burst, not the restart
        assert_eq!(monitor.on_garbage(500, 7000), LinkEvent::None);
        assert_eq!(monitor.on_garbage(500, 12_001), LinkEvent::PeerRestart);
        assert_eq!(monitor.stats().restarts, 2);
    }

    #[test]
    fn test_discard_counter() {
        let mut monitor = monitor();
        monitor.discard(64);
        monitor.discard(36);
        assert_eq!(monitor.stats().discarded_bytes, 100);
    }
}
