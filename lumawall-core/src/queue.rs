//! Command queue between the receive path and the apply loop

use heapless::Deque;
use lumawall_protocol::Command;

/// Queue depth; the receive path drains the queue before it overflows
pub const COMMAND_QUEUE_DEPTH: usize = 64;

/// Strict FIFO of decoded commands
///
/// Single consumer: a popped command belongs to the caller, which applies
/// and drops it before popping the next one.
pub struct CommandQueue {
    queue: Deque<Command, COMMAND_QUEUE_DEPTH>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Append a command, handing it back if the queue is full
    pub fn push(&mut self, command: Command) -> Result<(), Command> {
        self.queue.push_back(command)
    }

    pub fn pop_or_none(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }
}
