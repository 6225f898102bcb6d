//! Opal runtime wiring.
//!
//! Brings the scheduler, the input bridge and the presentation thread up in
//! order and exposes the interface the interpreter drives.

#![forbid(unsafe_code)]

use std::sync::Arc;

use opal_abi::{
    AsyncRequest, Bitmap, DrawCommand, DrawableId, FsHandler, FsOperation, FsResult, GlyphProvider, GraphicsOp,
    GraphicsResult, OplError, OplResult, Response, SchedulerFault, SoundPlayer,
};
use opal_drivers::{EventBridge, FsGate, SoundRequest};
use opal_lib::{RuntimeConfig, config_from_cmdline, klog_debug, klog_error, klog_info, klog_set_level};
use opal_sched::{Request, RequestHooks, Scheduler, TimerAfter, TimerAt};
use opal_video::{Image, Presenter, PresenterHandle, WindowServer};

pub struct Runtime {
    config: RuntimeConfig,
    scheduler: Arc<Scheduler>,
    events: Arc<EventBridge>,
    sound: Arc<dyn SoundPlayer>,
    fs: FsGate,
    presenter: PresenterHandle,
}

impl Runtime {
    pub fn new(
        config: RuntimeConfig,
        glyphs: Arc<dyn GlyphProvider>,
        sound: Arc<dyn SoundPlayer>,
        fs: Arc<dyn FsHandler>,
    ) -> OplResult<Self> {
        klog_set_level(config.log_level);

        let scheduler = Scheduler::new();
        let events = EventBridge::new(config.key_events);
        let fs = FsGate::new(fs, config.fs_writable);
        klog_debug!("runtime: scheduler and input bridge ready");

        let presenter = Presenter::spawn(WindowServer::new(config.clone(), glyphs)).map_err(|err| {
            klog_error!("runtime: cannot start presentation thread: {}", err);
            OplError::OsError
        })?;

        klog_info!(
            "runtime: screen {}x{} {:?}, fs {}",
            config.screen.width,
            config.screen.height,
            config.root_mode,
            if fs.is_read_only() { "read-only" } else { "writable" }
        );

        Ok(Self {
            config,
            scheduler,
            events,
            sound,
            fs,
            presenter,
        })
    }

    /// Same as [`Runtime::new`] with `key=value` settings from a command line
    pub fn from_cmdline(
        cmdline: &str,
        glyphs: Arc<dyn GlyphProvider>,
        sound: Arc<dyn SoundPlayer>,
        fs: Arc<dyn FsHandler>,
    ) -> OplResult<Self> {
        Self::new(config_from_cmdline(cmdline), glyphs, sound, fs)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Apply a draw batch; the first failing command aborts the rest
    pub fn draw(&self, commands: Vec<DrawCommand>) -> OplResult<()> {
        self.presenter.draw(commands)
    }

    pub fn graphicsop(&self, op: GraphicsOp) -> GraphicsResult {
        self.presenter.graphicsop(op)
    }

    /// Composited screen as currently shown
    pub fn screen_image(&self) -> OplResult<Arc<Image>> {
        self.presenter.with_server(|server| server.screen_image())
    }

    /// Create bitmap `id` from packed pixel data
    pub fn load_bitmap(&self, id: DrawableId, bitmap: Bitmap) -> OplResult<()> {
        self.presenter.with_server(move |server| server.load_bitmap(id, &bitmap))?
    }

    pub fn save_bitmap(&self, id: DrawableId) -> OplResult<Bitmap> {
        self.presenter.with_server(move |server| server.save_bitmap(id))?
    }

    /// Register `request` under `handle` and start its source
    pub fn async_request(&self, handle: i32, request: AsyncRequest) -> Result<(), SchedulerFault> {
        let kind = request.kind();
        let hooks: Box<dyn RequestHooks> = match request {
            AsyncRequest::GetEvent | AsyncRequest::KeyWait => self.events.request_hooks(kind),
            AsyncRequest::After(delay) => Box::new(TimerAfter::new(delay)),
            AsyncRequest::At(at) => Box::new(TimerAt::new(at)),
            AsyncRequest::PlaySound(samples) => Box::new(SoundRequest::new(Arc::clone(&self.sound), samples)),
        };
        self.scheduler.add_pending_request(Request::new(handle, kind, hooks))
    }

    pub fn cancel_request(&self, handle: i32) {
        self.scheduler.cancel_request(handle);
    }

    pub fn wait_for_any_request(&self) -> Response {
        self.scheduler.wait_for_any_request()
    }

    pub fn any_request(&self) -> Option<Response> {
        self.scheduler.any_request()
    }

    pub fn test_event(&self) -> bool {
        self.events.test_event()
    }

    pub fn keys_down(&self) -> Vec<u32> {
        self.events.keys_down()
    }

    pub fn interrupt(&self) {
        self.scheduler.interrupt();
    }

    pub fn fs_op(&self, op: &FsOperation) -> OplResult<FsResult> {
        self.fs.perform(op)
    }

    /// Input side for the presentation layer
    pub fn events(&self) -> &Arc<EventBridge> {
        &self.events
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn presenter(&self) -> &PresenterHandle {
        &self.presenter
    }

    /// Stop the presentation thread and wake a blocked interpreter
    pub fn shutdown(&mut self) {
        klog_debug!("runtime: shutting down");
        self.presenter.shutdown();
        self.scheduler.interrupt();
    }
}
