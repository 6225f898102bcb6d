//! Presentation thread and its handle.
//!
//! The window server lives on one dedicated thread. Callers queue a command
//! and block on a oneshot reply, which gives every draw and graphics
//! operation a single total order. Between commands the thread sleeps until
//! the next timer deadline.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use opal_abi::{DrawCommand, GraphicsOp, GraphicsResult, OplError, OplResult};
use opal_lib::{klog_debug, klog_error};

use super::WindowServer;
use super::events::ServerCommand;
use super::queue::CommandQueue;

struct Shared {
    queue: CommandQueue,
    alive: AtomicBool,
}

/// Marks the presenter dead however its thread exits, dropping any queued
/// reply senders so blocked callers wake up.
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.alive.store(false, Ordering::Release);
        let orphaned = self.0.queue.drain();
        if !orphaned.is_empty() {
            klog_debug!("presenter: dropped {} queued commands", orphaned.len());
        }
    }
}

pub struct Presenter;

impl Presenter {
    /// Move `server` onto a new presentation thread
    pub fn spawn(server: WindowServer) -> io::Result<PresenterHandle> {
        let shared = Arc::new(Shared {
            queue: CommandQueue::new(),
            alive: AtomicBool::new(true),
        });
        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("opal-presenter".into())
            .spawn(move || run(server, worker))?;
        Ok(PresenterHandle {
            shared,
            thread: Some(thread),
        })
    }
}

fn run(mut server: WindowServer, shared: Arc<Shared>) {
    let guard = ExitGuard(shared);
    klog_debug!("presenter: started");
    loop {
        server.run_timers(Instant::now());
        if guard.0.queue.has_pending() {
            for command in guard.0.queue.drain() {
                if matches!(command, ServerCommand::Shutdown) {
                    klog_debug!("presenter: shutting down");
                    return;
                }
                server.handle_command(command);
                server.run_timers(Instant::now());
            }
            continue;
        }
        match server.next_deadline() {
            Some(deadline) => {
                let now = Instant::now();
                if deadline > now {
                    thread::park_timeout(deadline - now);
                }
            }
            None => thread::park(),
        }
    }
}

/// Caller side of the presentation thread; shuts it down on drop
pub struct PresenterHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PresenterHandle {
    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    fn submit(&self, mut command: ServerCommand) -> OplResult<()> {
        let Some(thread) = &self.thread else {
            return Err(OplError::GeneralFail);
        };
        loop {
            if !self.is_alive() {
                klog_error!("presenter: {} submitted after exit", command.name());
                return Err(OplError::GeneralFail);
            }
            match self.shared.queue.enqueue(command) {
                Ok(()) => break,
                Err(back) => {
                    command = back;
                    thread.thread().unpark();
                    thread::yield_now();
                }
            }
        }
        thread.thread().unpark();
        Ok(())
    }

    /// Apply a draw batch and wait for it
    pub fn draw(&self, commands: Vec<DrawCommand>) -> OplResult<()> {
        let (reply, rx) = mpsc::channel();
        self.submit(ServerCommand::Draw { commands, reply })?;
        rx.recv().unwrap_or(Err(OplError::GeneralFail))
    }

    pub fn graphicsop(&self, op: GraphicsOp) -> GraphicsResult {
        let (reply, rx) = mpsc::channel();
        if let Err(err) = self.submit(ServerCommand::Graphics { op, reply }) {
            return GraphicsResult::Error(err);
        }
        rx.recv().unwrap_or(GraphicsResult::Error(OplError::GeneralFail))
    }

    /// Run `f` on the presentation thread and return its result
    pub fn with_server<R, F>(&self, f: F) -> OplResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut WindowServer) -> R + Send + 'static,
    {
        let (reply, rx) = mpsc::channel();
        self.submit(ServerCommand::Run(Box::new(move |server| {
            let _ = reply.send(f(server));
        })))?;
        rx.recv().map_err(|_| OplError::GeneralFail)
    }

    pub fn shutdown(&mut self) {
        if self.thread.is_none() {
            return;
        }
        let _ = self.submit(ServerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                klog_error!("presenter: thread panicked");
            }
        }
    }
}

impl Drop for PresenterHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
