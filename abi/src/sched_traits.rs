//! Async request types and the sound collaborator interface.
//!
//! These are defined in `abi` so that:
//! - `sched` can track requests without knowing where completions come from
//! - `drivers` can complete input and sound requests
//! - the embedding application supplies the audio backend

use core::time::Duration;
use std::time::SystemTime;

use crate::error::OplError;
use crate::input::Event;

/// Handle value reserved for the interrupt sentinel response
pub const INTERRUPT_HANDLE: i32 = -1;

/// Kind of an outstanding request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestKind {
    GetEvent,
    KeyWait,
    TimerAfter,
    TimerAt,
    PlaySound,
}

impl RequestKind {
    /// GETEVENT and KEYA may not be outstanding at the same time
    #[inline]
    pub fn is_input_wait(self) -> bool {
        matches!(self, Self::GetEvent | Self::KeyWait)
    }
}

/// What the interpreter asks for
#[derive(Clone, Debug, PartialEq)]
pub enum AsyncRequest {
    GetEvent,
    KeyWait,
    After(Duration),
    At(SystemTime),
    PlaySound(Vec<u8>),
}

impl AsyncRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::GetEvent => RequestKind::GetEvent,
            Self::KeyWait => RequestKind::KeyWait,
            Self::After(_) => RequestKind::TimerAfter,
            Self::At(_) => RequestKind::TimerAt,
            Self::PlaySound(_) => RequestKind::PlaySound,
        }
    }
}

/// Value a request completes with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseValue {
    Completed,
    Cancelled,
    Interrupt,
    Event(Event),
    Error(OplError),
}

/// A completed request as handed back to the interpreter
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub handle: i32,
    pub value: ResponseValue,
}

impl Response {
    pub const INTERRUPT: Response = Response {
        handle: INTERRUPT_HANDLE,
        value: ResponseValue::Interrupt,
    };

    #[inline]
    pub fn is_interrupt(&self) -> bool {
        self.handle == INTERRUPT_HANDLE
    }
}

/// Invoked once when playback stops, with the outcome
pub type PlaybackDone = Box<dyn FnOnce(Result<(), OplError>) + Send>;

/// A playback in progress
pub trait PlaybackTask: Send {
    /// Stop playback. Must not block and must not call the done callback.
    fn cancel(&mut self);
}

/// Audio collaborator
pub trait SoundPlayer: Send + Sync {
    /// Start playing raw samples; `done` fires when playback finishes.
    fn play(&self, samples: Vec<u8>, done: PlaybackDone) -> Box<dyn PlaybackTask>;
}
