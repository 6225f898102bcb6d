//! Timer request sources.
//!
//! Each timer waits on its own helper thread. Cancelling drops the sender
//! half of a channel, which wakes the helper without blocking the caller.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, SystemTime};

use opal_abi::{OplError, ResponseValue};
use opal_lib::{klog_debug, klog_error};

use crate::scheduler::{Completer, RequestHooks};

fn spawn_timer(delay: Duration, completer: Completer) -> Option<Sender<()>> {
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
    let fallback = completer.clone();
    let spawned = thread::Builder::new()
        .name(format!("opal-timer-{}", completer.handle()))
        .spawn(move || match cancel_rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                if !completer.try_complete(ResponseValue::Completed) {
                    klog_debug!("timer: request {} already finished", completer.handle());
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        });

    match spawned {
        Ok(_) => Some(cancel_tx),
        Err(err) => {
            timer_unavailable(&fallback, &err);
            None
        }
    }
}

/// Fail a timer request whose helper thread could not be started
fn timer_unavailable(completer: &Completer, err: &io::Error) {
    klog_error!("timer: cannot start helper for request {}: {}", completer.handle(), err);
    completer.try_complete(ResponseValue::Error(OplError::NoMemory));
}

/// Completes after a relative delay
#[derive(Debug)]
pub struct TimerAfter {
    delay: Duration,
    cancel: Option<Sender<()>>,
}

impl TimerAfter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            cancel: None,
        }
    }
}

impl RequestHooks for TimerAfter {
    fn start(&mut self, completer: Completer) {
        klog_debug!("timer: request {} after {:?}", completer.handle(), self.delay);
        self.cancel = spawn_timer(self.delay, completer);
    }

    fn cancel(&mut self) {
        self.cancel.take();
    }
}

/// Completes at an absolute wall-clock time; times in the past fire at once
#[derive(Debug)]
pub struct TimerAt {
    at: SystemTime,
    cancel: Option<Sender<()>>,
}

impl TimerAt {
    pub fn new(at: SystemTime) -> Self {
        Self { at, cancel: None }
    }
}

impl RequestHooks for TimerAt {
    fn start(&mut self, completer: Completer) {
        let delay = self
            .at
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        klog_debug!("timer: request {} at {:?} (in {:?})", completer.handle(), self.at, delay);
        self.cancel = spawn_timer(delay, completer);
    }

    fn cancel(&mut self) {
        self.cancel.take();
    }
}
