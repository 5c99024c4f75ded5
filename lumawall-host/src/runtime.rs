//! Main loop
//!
//! One thread does everything, once per tick:
//! 1. Read whatever bytes the link has buffered
//! 2. Drop them while a peer-restart grace period is running
//! 3. Extract frames, admit them into the command queue
//! 4. Apply queued commands in order, one response each
//! 5. Advance animations and composite one frame
//!
//! Nothing in this path is fatal. Link errors, bad frames and panel errors
//! are logged and the loop carries on.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, trace, warn};

use lumawall_core::link::LinkEvent;
use lumawall_core::{
    Admission, AnimationScheduler, CommandQueue, Controller, LinkRecoveryMonitor, RenderOutcome,
    RenderPipeline, ResponseEmitter,
};
use lumawall_display::PanelDriver;
use lumawall_protocol::{FeedStatus, Frame, FrameSynchronizer, SyncEvent};

use crate::config::ScreenConfig;
use crate::fonts::FontLibrary;
use crate::images::ImageLibrary;
use crate::serial::ByteLink;
use crate::tick::{MonotonicClock, Ticker};

/// Bytes read from the link per call
const READ_CHUNK: usize = 512;

/// Upper bound on reads per tick so a flooding peer cannot starve rendering
const MAX_READS_PER_TICK: usize = 16;

/// Wall controller main loop state
pub struct Runtime<L: ByteLink, P: PanelDriver> {
    link: L,
    panel: P,
    controller: Controller,
    sync: FrameSynchronizer,
    monitor: LinkRecoveryMonitor,
    queue: CommandQueue,
    emitter: ResponseEmitter,
    scheduler: AnimationScheduler,
    pipeline: RenderPipeline,
    images: ImageLibrary,
    fonts: FontLibrary,
    tick_hz: u16,
}

impl<L: ByteLink, P: PanelDriver> Runtime<L, P> {
    pub fn new(config: &ScreenConfig, link: L, panel: P, images: ImageLibrary, fonts: FontLibrary) -> Self {
        Self {
            link,
            panel,
            controller: Controller::new(config.screen_id, &config.panel),
            sync: FrameSynchronizer::new(),
            monitor: LinkRecoveryMonitor::new(config.link),
            queue: CommandQueue::new(),
            emitter: ResponseEmitter::new(),
            scheduler: AnimationScheduler::new(config.timing),
            pipeline: RenderPipeline::new(config.display.show_diagnostics),
            images,
            fonts,
            tick_hz: config.timing.tick_hz,
        }
    }

    /// Run one loop iteration at `now_ms`
    pub fn step(&mut self, now_ms: u64) -> RenderOutcome {
        self.receive(now_ms);
        self.drain(now_ms);
        self.scheduler.tick(self.controller.store_mut(), now_ms);

        let brightness = self.controller.brightness();
        match self
            .pipeline
            .render(self.controller.store_mut(), brightness, &mut self.panel, &self.fonts)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Render failed: {}", e);
                RenderOutcome::Skipped
            }
        }
    }

    /// Loop at the configured rate until `shutdown` is set, then blank the panel
    pub fn run(&mut self, shutdown: &AtomicBool) {
        let clock = MonotonicClock::new();
        let mut ticker = Ticker::from_hz(self.tick_hz);
        info!("Main loop running at {} Hz", self.tick_hz);

        while !shutdown.load(Ordering::Relaxed) {
            self.step(clock.now_ms());
            ticker.wait();
        }

        info!("Shutting down");
        self.blank();
        self.log_stats();
    }

    fn receive(&mut self, now_ms: u64) {
        let mut buffer = [0u8; READ_CHUNK];

        for _ in 0..MAX_READS_PER_TICK {
            let n = match self.link.read_available(&mut buffer) {
                Ok(0) => return,
                Ok(n) => n,
                Err(e) => {
                    warn!("Link read failed: {:?}", e);
                    return;
                }
            };
            trace!("RX: {} bytes", n);

            if !self.monitor.accepts_input(now_ms) {
                self.monitor.discard(n);
                continue;
            }

            if let FeedStatus::Overflow { trimmed } = self.sync.feed(&buffer[..n]) {
                warn!("Receive buffer overflow, dropped {} bytes", trimmed);
            }

            if !self.extract(now_ms) {
                // Peer restarted; the rest of this burst is boot noise
                continue;
            }
            if n < READ_CHUNK {
                return;
            }
        }
    }

    /// Pull frames out of the synchronizer; false after a peer restart
    fn extract(&mut self, now_ms: u64) -> bool {
        loop {
            match self.sync.poll() {
                SyncEvent::Incomplete => return true,
                SyncEvent::Garbage(len) => {
                    trace!("Skipped {} unsynchronized bytes", len);
                    if self.monitor.on_garbage(len, now_ms) == LinkEvent::PeerRestart {
                        if let Err(e) = self.link.discard_input() {
                            warn!("Failed to flush link buffers: {:?}", e);
                        }
                        self.sync.clear();
                        return false;
                    }
                }
                SyncEvent::Frame(frame) => self.admit(frame, now_ms),
            }
        }
    }

    fn admit(&mut self, frame: Frame, now_ms: u64) {
        match self.controller.admit(&frame, &mut self.queue) {
            Admission::Queued | Admission::Ignored => {}
            Admission::Rejected(reply) => {
                // Earlier commands answer first so replies stay in frame order
                self.drain(now_ms);
                let screen_id = self.controller.screen_id();
                self.emitter.send_reply(&mut self.link, screen_id, &reply);
            }
            Admission::Full(command) => {
                debug!("Command queue full, draining");
                self.drain(now_ms);
                if self.queue.push(command).is_err() {
                    warn!("Command dropped: queue still full after draining");
                }
            }
        }
    }

    fn drain(&mut self, now_ms: u64) {
        let screen_id = self.controller.screen_id();
        while let Some(command) = self.queue.pop_or_none() {
            let reply = self.controller.apply(command, &self.images, &self.fonts, now_ms);
            self.emitter.send_reply(&mut self.link, screen_id, &reply);
        }
    }

    /// Clear the panel and make the blank frame visible
    pub fn blank(&mut self) {
        let result = self.panel.clear().and_then(|()| self.panel.present());
        if let Err(e) = result {
            warn!("Failed to blank panel: {}", e);
        }
    }

    pub fn log_stats(&self) {
        let sync = self.sync.stats();
        let link = self.monitor.stats();
        info!(
            "Frames: {}, garbage bytes: {}, false starts: {}, overflow bytes: {}",
            sync.frames, sync.garbage_bytes, sync.false_starts, sync.overflow_bytes
        );
        info!(
            "Peer restarts: {}, bytes discarded in grace: {}",
            link.restarts, link.discarded_bytes
        );
        info!(
            "Responses sent: {}, failed: {}, frames painted: {}",
            self.emitter.sent(),
            self.emitter.failed(),
            self.pipeline.frames_painted()
        );
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn monitor(&self) -> &LinkRecoveryMonitor {
        &self.monitor
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.sync
    }

    pub fn emitter(&self) -> &ResponseEmitter {
        &self.emitter
    }
}
