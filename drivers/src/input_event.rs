//! Event bridge between the presentation layer and the scheduler.
//!
//! Input events land in one FIFO queue. At most one input wait (GETEVENT or
//! KEYA) is outstanding at a time; whenever one is registered and the queue
//! is non-empty the oldest suitable event completes it. A KEYA wait consumes
//! and drops events that carry no character.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use spin::Mutex;

use opal_abi::{Event, KeyInfo, Modifiers, PenInfo, RequestKind, ResponseValue};
use opal_lib::{KeyEventMode, klog_debug, klog_trace, klog_warn};
use opal_sched::{Completer, RequestHooks};

use crate::keyboard::modified_keycode;

/// Events kept while nobody is waiting; the oldest are dropped beyond this
const MAX_QUEUED_EVENTS: usize = 256;

/// Pen transition reported by the presentation layer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PenAction {
    Down,
    Up,
    Drag,
}

struct Waiter {
    kind: RequestKind,
    completer: Completer,
    token: u64,
}

#[derive(Default)]
struct BridgeState {
    queue: VecDeque<Event>,
    waiter: Option<Waiter>,
    keys_down: BTreeSet<u32>,
}

impl BridgeState {
    fn push(&mut self, event: Event) {
        if self.queue.len() >= MAX_QUEUED_EVENTS {
            self.queue.pop_front();
            klog_warn!("input: queue full, oldest event dropped");
        }
        self.queue.push_back(event);
    }
}

pub struct EventBridge {
    state: Mutex<BridgeState>,
    key_events: KeyEventMode,
    epoch: Instant,
    next_token: AtomicU64,
}

impl EventBridge {
    pub fn new(key_events: KeyEventMode) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BridgeState::default()),
            key_events,
            epoch: Instant::now(),
            next_token: AtomicU64::new(1),
        })
    }

    /// Milliseconds since the bridge was created
    pub fn timestamp(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn key(&self, keycode: u32, modifiers: Modifiers) -> KeyInfo {
        KeyInfo {
            keycode,
            modifiers,
            timestamp: self.timestamp(),
        }
    }

    /// Physical key went down; also synthesizes the key press
    pub fn key_down(&self, keycode: u32, modifiers: Modifiers) {
        self.state.lock().keys_down.insert(keycode);
        if self.key_events == KeyEventMode::DownUp {
            self.post(Event::KeyDown(self.key(keycode, modifiers)));
        }
        self.press(keycode, modifiers, false);
    }

    pub fn key_up(&self, keycode: u32, modifiers: Modifiers) {
        self.state.lock().keys_down.remove(&keycode);
        if self.key_events == KeyEventMode::DownUp {
            self.post(Event::KeyUp(self.key(keycode, modifiers)));
        }
    }

    /// Auto-repeat of a held key
    pub fn key_repeat(&self, keycode: u32, modifiers: Modifiers) {
        self.press(keycode, modifiers, true);
    }

    /// A key press from a platform that reports no down/up transitions
    pub fn key_press(&self, keycode: u32, modifiers: Modifiers) {
        self.press(keycode, modifiers, false);
    }

    fn press(&self, keycode: u32, modifiers: Modifiers, repeat: bool) {
        match modified_keycode(keycode, modifiers) {
            Some(code) => self.post(Event::KeyPress {
                key: self.key(code, modifiers),
                repeat,
            }),
            None => klog_trace!("input: no key press for {} with {:?}", keycode, modifiers),
        }
    }

    pub fn pen(&self, action: PenAction, info: PenInfo) {
        self.post(match action {
            PenAction::Down => Event::PenDown(info),
            PenAction::Up => Event::PenUp(info),
            PenAction::Drag => Event::PenDrag(info),
        });
    }

    /// Queue an event and hand it to a waiting request if there is one
    pub fn post(&self, event: Event) {
        self.state.lock().push(event);
        self.dispatch();
    }

    /// True when an event is queued
    pub fn test_event(&self) -> bool {
        !self.state.lock().queue.is_empty()
    }

    /// Keys currently held, ascending
    pub fn keys_down(&self) -> Vec<u32> {
        self.state.lock().keys_down.iter().copied().collect()
    }

    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Scheduler hooks that satisfy a GETEVENT or KEYA request from this bridge
    pub fn request_hooks(self: &Arc<Self>, kind: RequestKind) -> Box<dyn RequestHooks> {
        Box::new(InputRequest {
            bridge: Arc::clone(self),
            kind,
            token: None,
        })
    }

    fn set_waiter(&self, kind: RequestKind, completer: Completer) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.state.lock();
            if let Some(old) = state.waiter.replace(Waiter {
                kind,
                completer,
                token,
            }) {
                klog_warn!("input: waiter {} replaced", old.completer.handle());
            }
        }
        self.dispatch();
        token
    }

    fn clear_waiter(&self, token: u64) {
        let mut state = self.state.lock();
        if state.waiter.as_ref().is_some_and(|w| w.token == token) {
            state.waiter = None;
        }
    }

    /// Complete the waiter with the next suitable event. Completion happens
    /// outside the bridge lock; an event that loses to cancellation goes
    /// back to the front of the queue.
    fn dispatch(&self) {
        loop {
            let (waiter, event) = {
                let mut state = self.state.lock();
                let Some(kind) = state.waiter.as_ref().map(|w| w.kind) else {
                    return;
                };
                let event = loop {
                    let Some(event) = state.queue.pop_front() else {
                        return;
                    };
                    if kind == RequestKind::KeyWait && event.char_code().is_none() {
                        klog_trace!("input: keywait drops {:?}", event);
                        continue;
                    }
                    break event;
                };
                let Some(waiter) = state.waiter.take() else {
                    state.queue.push_front(event);
                    return;
                };
                (waiter, event)
            };
            if waiter.completer.try_complete(ResponseValue::Event(event)) {
                klog_debug!("input: request {} completed", waiter.completer.handle());
                return;
            }
            self.state.lock().queue.push_front(event);
        }
    }
}

struct InputRequest {
    bridge: Arc<EventBridge>,
    kind: RequestKind,
    token: Option<u64>,
}

impl RequestHooks for InputRequest {
    fn start(&mut self, completer: Completer) {
        self.token = Some(self.bridge.set_waiter(self.kind, completer));
    }

    fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            self.bridge.clear_waiter(token);
        }
    }
}
