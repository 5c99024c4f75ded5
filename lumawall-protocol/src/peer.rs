//! Sender half for the co-processor
//!
//! Producers enqueue commands without blocking; a single transmitter owns
//! the link and drains the queue in FIFO order. A full queue drops the new
//! command instead of stalling the producer.

use heapless::Deque;

use crate::commands::Command;
use crate::link::LinkWriter;

/// Default queue depth used by the co-processor firmware
pub const DEFAULT_QUEUE_DEPTH: usize = 20;

/// Returned when a command was dropped because the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Bounded outbound command queue
pub struct CommandSender<const N: usize> {
    queue: Deque<Command, N>,
    dropped: u32,
    sent: u32,
}

impl<const N: usize> Default for CommandSender<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandSender<N> {
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
            sent: 0,
        }
    }

    /// Enqueue a command without blocking
    ///
    /// Returns `Err(QueueFull)` and drops the command when the queue is full.
    pub fn try_send(&mut self, command: Command) -> Result<(), QueueFull> {
        self.queue.push_back(command).map_err(|_| {
            self.dropped = self.dropped.saturating_add(1);
            QueueFull
        })
    }

    /// Encode and write every queued command, oldest first
    ///
    /// Returns the number of frames written. On a write error the failing
    /// command is lost and the rest stay queued.
    pub fn drain<W: LinkWriter>(&mut self, link: &mut W) -> Result<usize, W::Error> {
        let mut written = 0;

        while let Some(command) = self.queue.pop_front() {
            let encoded = match command.to_frame().and_then(|frame| frame.encode_to_vec()) {
                Ok(encoded) => encoded,
                Err(_) => {
                    self.dropped = self.dropped.saturating_add(1);
                    continue;
                }
            };
            link.write_all(&encoded)?;
            written += 1;
            self.sent = self.sent.saturating_add(1);
        }

        if written > 0 {
            link.flush()?;
        }
        Ok(written)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Commands dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }
}
