//! Window server timers.
//!
//! All timers run on the presentation thread. Each kind is armed at most
//! once, so re-arming replaces the previous deadline and cancelling is a
//! single map removal.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use opal_abi::DrawableId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerKind {
    SpriteTick,
    ClockTick,
    CursorFlash,
    BusyShow(DrawableId),
    InfoDismiss(DrawableId),
}

#[derive(Copy, Clone, Debug)]
struct Deadline {
    at: Instant,
    interval: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct ServerTimers {
    armed: BTreeMap<TimerKind, Deadline>,
}

impl ServerTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` at `at`, then every `interval` if one is given
    pub fn arm(&mut self, kind: TimerKind, at: Instant, interval: Option<Duration>) {
        self.armed.insert(kind, Deadline { at, interval });
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.armed.remove(&kind).is_some()
    }

    #[inline]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().map(|d| d.at).min()
    }

    /// Timers due at `now`, earliest first. One-shot timers are disarmed and
    /// repeating ones move to their next deadline; each fires at most once.
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired: Vec<(Instant, TimerKind)> = self
            .armed
            .iter()
            .filter(|(_, d)| d.at <= now)
            .map(|(kind, d)| (d.at, *kind))
            .collect();
        fired.sort();
        for (at, kind) in &fired {
            let Some(interval) = self.armed.get(kind).and_then(|d| d.interval) else {
                self.armed.remove(kind);
                continue;
            };
            let mut next = *at + interval;
            if next <= now {
                next = now + interval;
            }
            self.arm(*kind, next, Some(interval));
        }
        fired.into_iter().map(|(_, kind)| kind).collect()
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}
