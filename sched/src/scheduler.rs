//! Request/completion rendezvous between the interpreter and async sources.
//!
//! The interpreter registers requests by handle and then blocks in
//! `wait_for_any_request` until one of them completes. Completions arrive from
//! timer threads, the input bridge, sound playback or direct cancellation.
//! Every state change happens under one monitor and wakes all waiters.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use opal_abi::{RequestKind, Response, ResponseValue, SchedulerFault};
use opal_lib::{klog_debug, klog_error, klog_trace};

/// Per-request behavior supplied by whatever produces the completion.
pub trait RequestHooks: Send {
    /// Called once after registration, outside the scheduler lock.
    fn start(&mut self, completer: Completer);

    /// Called under the scheduler lock when the request is cancelled.
    /// Must not block and must not call back into the scheduler.
    fn cancel(&mut self);
}

/// Hooks for requests completed directly through `Scheduler::complete`
#[derive(Debug, Default)]
pub struct NoopHooks;

impl RequestHooks for NoopHooks {
    fn start(&mut self, _completer: Completer) {}
    fn cancel(&mut self) {}
}

/// A request ready for registration
pub struct Request {
    pub handle: i32,
    pub kind: RequestKind,
    pub hooks: Box<dyn RequestHooks>,
}

impl Request {
    pub fn new(handle: i32, kind: RequestKind, hooks: Box<dyn RequestHooks>) -> Self {
        Self {
            handle,
            kind,
            hooks,
        }
    }
}

struct PendingRequest {
    kind: RequestKind,
    generation: u64,
    /// `None` while the start hook runs or once cancelled
    hooks: Option<Box<dyn RequestHooks>>,
    response: Option<ResponseValue>,
}

#[derive(Default)]
struct SchedState {
    requests: BTreeMap<i32, PendingRequest>,
    /// Completed handles in completion order
    ready: VecDeque<i32>,
    interrupted: bool,
    next_generation: u64,
    /// Generations cancelled while their start hook was still running
    cancelled_starting: BTreeSet<u64>,
}

impl SchedState {
    fn input_wait_pending(&self) -> bool {
        self.requests.values().any(|r| r.kind.is_input_wait())
    }

    fn take_ready(&mut self) -> Option<Response> {
        while let Some(handle) = self.ready.pop_front() {
            if let Some(req) = self.requests.remove(&handle) {
                if let Some(value) = req.response {
                    return Some(Response { handle, value });
                }
            }
        }
        None
    }

    fn next_response(&mut self) -> Option<Response> {
        if self.interrupted {
            self.interrupted = false;
            return Some(Response::INTERRUPT);
        }
        self.take_ready()
    }

    fn set_response(
        &mut self,
        handle: i32,
        generation: Option<u64>,
        value: ResponseValue,
    ) -> Result<(), SchedulerFault> {
        let req = self
            .requests
            .get_mut(&handle)
            .filter(|req| generation.is_none_or(|g| g == req.generation))
            .ok_or(SchedulerFault::UnknownRequest(handle))?;
        if req.response.is_some() {
            return Err(SchedulerFault::AlreadyCompleted(handle));
        }
        req.response = Some(value);
        req.hooks = None;
        self.ready.push_back(handle);
        Ok(())
    }
}

/// Completion side of one registered request.
///
/// Holds only a weak reference, so a source that outlives the scheduler
/// completes into nothing.
#[derive(Clone)]
pub struct Completer {
    scheduler: Weak<Scheduler>,
    handle: i32,
    generation: u64,
}

impl Completer {
    #[inline]
    pub fn handle(&self) -> i32 {
        self.handle
    }

    /// Strict completion: faults if the request is gone or already done.
    pub fn complete(&self, value: ResponseValue) -> Result<(), SchedulerFault> {
        match self.scheduler.upgrade() {
            Some(sched) => sched.complete_generation(self.handle, Some(self.generation), value),
            None => Err(SchedulerFault::UnknownRequest(self.handle)),
        }
    }

    /// Completion that may lose a race with cancellation.
    pub fn try_complete(&self, value: ResponseValue) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|sched| sched.try_complete_generation(self.handle, self.generation, value))
    }
}

impl core::fmt::Debug for Completer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Completer")
            .field("handle", &self.handle)
            .field("generation", &self.generation)
            .finish()
    }
}

pub struct Scheduler {
    state: Mutex<SchedState>,
    changed: Condvar,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SchedState::default()),
            changed: Condvar::new(),
        })
    }

    /// Register a request and run its start hook.
    pub fn add_pending_request(self: &Arc<Self>, request: Request) -> Result<(), SchedulerFault> {
        let Request {
            handle,
            kind,
            mut hooks,
        } = request;

        let generation = {
            let mut state = self.state.lock();
            if state.requests.contains_key(&handle) {
                klog_error!("sched: duplicate request {}", handle);
                return Err(SchedulerFault::DuplicateRequest(handle));
            }
            if kind.is_input_wait() && state.input_wait_pending() {
                klog_error!("sched: request {} ({:?}) while an input wait is pending", handle, kind);
                return Err(SchedulerFault::ExclusiveRequestPending(handle));
            }
            let generation = state.next_generation;
            state.next_generation += 1;
            state.requests.insert(
                handle,
                PendingRequest {
                    kind,
                    generation,
                    hooks: None,
                    response: None,
                },
            );
            self.changed.notify_all();
            generation
        };
        klog_debug!("sched: request {} ({:?}) added", handle, kind);

        hooks.start(Completer {
            scheduler: Arc::downgrade(self),
            handle,
            generation,
        });

        let mut state = self.state.lock();
        let cancelled = state.cancelled_starting.remove(&generation);
        match state.requests.get_mut(&handle) {
            Some(req) if req.generation == generation && req.response.is_none() => {
                req.hooks = Some(hooks);
            }
            // Cancelled while starting; stop the source.
            _ if cancelled => hooks.cancel(),
            // The source already completed the request.
            _ => {}
        }
        Ok(())
    }

    /// Complete a request. Completing twice or completing an unknown handle is
    /// a fault.
    pub fn complete(&self, handle: i32, value: ResponseValue) -> Result<(), SchedulerFault> {
        self.complete_generation(handle, None, value)
    }

    fn complete_generation(
        &self,
        handle: i32,
        generation: Option<u64>,
        value: ResponseValue,
    ) -> Result<(), SchedulerFault> {
        let mut state = self.state.lock();
        match state.set_response(handle, generation, value) {
            Ok(()) => {
                self.changed.notify_all();
                klog_debug!("sched: request {} completed with {:?}", handle, value);
                Ok(())
            }
            Err(fault) => {
                klog_error!("sched: {}", fault);
                Err(fault)
            }
        }
    }

    /// Complete unless already completed, cancelled or collected.
    pub fn try_complete(&self, handle: i32, value: ResponseValue) -> bool {
        let mut state = self.state.lock();
        let done = state.set_response(handle, None, value).is_ok();
        if done {
            self.changed.notify_all();
        }
        done
    }

    fn try_complete_generation(&self, handle: i32, generation: u64, value: ResponseValue) -> bool {
        let mut state = self.state.lock();
        let done = state.set_response(handle, Some(generation), value).is_ok();
        if done {
            self.changed.notify_all();
            klog_trace!("sched: request {} completed by its source", handle);
        }
        done
    }

    /// Cancel a pending request. Unknown or completed handles are ignored.
    pub fn cancel_request(&self, handle: i32) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(req) = state.requests.get_mut(&handle) else {
            return;
        };
        if req.response.is_some() {
            return;
        }
        match req.hooks.take() {
            Some(mut hooks) => hooks.cancel(),
            None => {
                state.cancelled_starting.insert(req.generation);
            }
        }
        req.response = Some(ResponseValue::Cancelled);
        state.ready.push_back(handle);
        self.changed.notify_all();
        klog_debug!("sched: request {} cancelled", handle);
    }

    /// Block until a request completes or the scheduler is interrupted.
    pub fn wait_for_any_request(&self) -> Response {
        let mut state = self.state.lock();
        loop {
            if let Some(response) = state.next_response() {
                self.changed.notify_all();
                return response;
            }
            self.changed.wait(&mut state);
        }
    }

    /// As `wait_for_any_request`, giving up after `timeout`.
    pub fn wait_for_any_request_timeout(&self, timeout: Duration) -> Option<Response> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(response) = state.next_response() {
                self.changed.notify_all();
                return Some(response);
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.next_response();
            }
        }
    }

    /// Non-blocking poll.
    pub fn any_request(&self) -> Option<Response> {
        let mut state = self.state.lock();
        let response = state.next_response();
        if response.is_some() {
            self.changed.notify_all();
        }
        response
    }

    /// Wake the interpreter; the next wait returns the interrupt sentinel.
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        self.changed.notify_all();
        klog_debug!("sched: interrupt raised");
    }

    /// Requests registered and not yet collected.
    pub fn pending_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn is_pending(&self, handle: i32) -> bool {
        self.state
            .lock()
            .requests
            .get(&handle)
            .is_some_and(|req| req.response.is_none())
    }
}
