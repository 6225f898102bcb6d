//! Command queue feeding the presentation thread.
//!
//! Commands are enqueued from the interpreter thread and drained in FIFO
//! order by the thread that owns the window server. The spin mutex is only
//! held for the push or the swap.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use super::events::ServerCommand;

/// Maximum number of commands that can be queued
const DEFAULT_QUEUE_CAPACITY: usize = 256;

pub struct CommandQueue {
    commands: Mutex<VecDeque<ServerCommand>>,
    /// Set on enqueue, cleared on drain
    pending: AtomicBool,
    capacity: usize,
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Mutex::new(VecDeque::new()),
            pending: AtomicBool::new(false),
            capacity,
        }
    }

    /// Queue `command`, handing it back when the queue is full.
    pub fn enqueue(&self, command: ServerCommand) -> Result<(), ServerCommand> {
        let mut guard = self.commands.lock();
        if guard.len() >= self.capacity {
            return Err(command);
        }
        guard.push_back(command);
        self.pending.store(true, Ordering::Release);
        Ok(())
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> VecDeque<ServerCommand> {
        self.pending.store(false, Ordering::Release);
        let mut guard = self.commands.lock();
        core::mem::take(&mut *guard)
    }

    /// Lock-free hint; may be stale by the time the caller drains
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
