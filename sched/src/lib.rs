//! Async request scheduling for the Opal runtime.

#![forbid(unsafe_code)]

pub mod scheduler;
pub mod timers;

pub use scheduler::{Completer, NoopHooks, Request, RequestHooks, Scheduler};
pub use timers::{TimerAfter, TimerAt};
