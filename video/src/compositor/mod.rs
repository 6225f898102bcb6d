//! Window server.
//!
//! The server owns every drawable and processes requests one at a time on
//! the presentation thread, so no drawable needs a lock of its own. Windows
//! are stacked front to back in `stack`; bitmaps never enter it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use opal_abi::{
    Bitmap, BitmapMode, ClockInfo, Color, CursorSpec, DrawCommand, DrawableId, FontInfo, GlyphProvider,
    GraphicsOp, GraphicsResult, OplError, OplResult, PeekMode, Point, Rect, Size, Sprite,
};
use opal_lib::{RuntimeConfig, klog_debug, klog_error, klog_info, klog_trace, klog_warn};

use crate::canvas::{Canvas, Image, is_ink, is_opaque};
use crate::graphics::{self, DrawContext};

pub mod api;
pub mod clock;
pub mod drawable;
pub mod events;
pub mod peek;
pub mod queue;
pub mod timers;

use drawable::{Drawable, SpriteState, Window};
use events::ServerCommand;
use timers::{ServerTimers, TimerKind};

/// Colour shown where only the grey plane has ink
const GREY_PLANE_COLOR: Color = Color::LIGHT_GREY;
const SHADOW_COLOR: Color = Color::DARK_GREY;

/// Ranked neighbour behind the info window, with its old index as fallback
#[derive(Copy, Clone, Debug, Default)]
struct InfoHome {
    behind: Option<DrawableId>,
    slot: usize,
}

#[derive(Copy, Clone, Debug)]
struct CursorState {
    spec: CursorSpec,
    drawn: bool,
}

pub struct WindowServer {
    config: RuntimeConfig,
    glyphs: Arc<dyn GlyphProvider>,
    drawables: BTreeMap<DrawableId, Drawable>,
    /// Window ids, front first
    stack: Vec<DrawableId>,
    /// Transient info window; kept out of rank accounting
    info: Option<DrawableId>,
    /// Where the info window goes back to in the ranking once released
    info_home: InfoHome,
    /// Window with a pending delayed show
    busy: Option<DrawableId>,
    cursor: Option<CursorState>,
    timers: ServerTimers,
    /// Time shown by clock overlays, refreshed every minute
    clock_time: SystemTime,
}

impl WindowServer {
    pub fn new(config: RuntimeConfig, glyphs: Arc<dyn GlyphProvider>) -> Self {
        let mut root = Window::new(Rect::from_parts(Point::ZERO, config.screen), config.root_mode, 0);
        root.visible = true;
        let mut drawables = BTreeMap::new();
        drawables.insert(DrawableId::ROOT, Drawable::Window(root));
        klog_info!(
            "window server: {}x{} screen, root mode {:?}",
            config.screen.width,
            config.screen.height,
            config.root_mode
        );
        Self {
            config,
            glyphs,
            drawables,
            stack: vec![DrawableId::ROOT],
            info: None,
            info_home: InfoHome::default(),
            busy: None,
            cursor: None,
            timers: ServerTimers::new(),
            clock_time: SystemTime::now(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[inline]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.drawables.contains_key(&id)
    }

    pub fn drawable(&self, id: DrawableId) -> OplResult<&Drawable> {
        self.drawables.get(&id).ok_or(OplError::DrawNotOpen)
    }

    pub fn window(&self, id: DrawableId) -> OplResult<&Window> {
        self.drawable(id)?.as_window().ok_or(OplError::InvalidWindow)
    }

    fn window_mut(&mut self, id: DrawableId) -> OplResult<&mut Window> {
        self.drawables
            .get_mut(&id)
            .ok_or(OplError::DrawNotOpen)?
            .as_window_mut()
            .ok_or(OplError::InvalidWindow)
    }

    /// Stack order without the info window
    fn ranked(&self) -> Vec<DrawableId> {
        self.stack
            .iter()
            .copied()
            .filter(|id| Some(*id) != self.info)
            .collect()
    }

    fn set_ranked(&mut self, ranked: Vec<DrawableId>) {
        self.stack = ranked;
        if let Some(info) = self.info {
            self.stack.insert(0, info);
        }
    }

    /// End the info role and put the window back in front of the window it
    /// was ranked before. Returns the released id.
    fn release_info(&mut self) -> Option<DrawableId> {
        let id = self.info?;
        let mut ranked = self.ranked();
        self.info = None;
        self.timers.cancel(TimerKind::InfoDismiss(id));
        if self.drawables.contains_key(&id) {
            let home = self.info_home;
            let at = home
                .behind
                .and_then(|behind| ranked.iter().position(|w| *w == behind))
                .unwrap_or(home.slot.min(ranked.len()));
            ranked.insert(at, id);
        }
        self.set_ranked(ranked);
        Some(id)
    }

    // =========================================================================
    // Drawable lifecycle
    // =========================================================================

    pub fn create_window(&mut self, id: DrawableId, frame: Rect, mode: BitmapMode, shadow: i32) -> OplResult<()> {
        if self.contains(id) {
            return Err(OplError::InvalidArgs);
        }
        if frame.is_empty() {
            return Err(OplError::InvalidArgs);
        }
        self.drawables.insert(id, Drawable::Window(Window::new(frame, mode, shadow)));
        let mut ranked = self.ranked();
        ranked.insert(0, id);
        self.set_ranked(ranked);
        klog_debug!(
            "window {} created at ({}, {}) {}x{} {:?}",
            id,
            frame.x(),
            frame.y(),
            frame.width(),
            frame.height(),
            mode
        );
        Ok(())
    }

    pub fn create_bitmap(&mut self, id: DrawableId, size: Size, mode: BitmapMode) -> OplResult<()> {
        if self.contains(id) || size.is_empty() {
            return Err(OplError::InvalidArgs);
        }
        self.drawables.insert(id, Drawable::Bitmap(Canvas::new(size, mode)));
        klog_debug!("bitmap {} created {}x{} {:?}", id, size.width, size.height, mode);
        Ok(())
    }

    /// Create bitmap `id` from packed native pixel data
    pub fn load_bitmap(&mut self, id: DrawableId, bitmap: &Bitmap) -> OplResult<()> {
        if self.contains(id) {
            return Err(OplError::InvalidArgs);
        }
        let canvas = Canvas::from_bitmap(bitmap).map_err(|err| {
            klog_error!("bitmap {}: {}", id, err);
            err
        })?;
        self.drawables.insert(id, Drawable::Bitmap(canvas));
        klog_debug!("bitmap {} loaded {}x{} {:?}", id, bitmap.width, bitmap.height, bitmap.mode);
        Ok(())
    }

    /// Packed native copy of a drawable's base plane
    pub fn save_bitmap(&self, id: DrawableId) -> OplResult<Bitmap> {
        self.drawable(id)?.base().to_bitmap().map_err(OplError::from)
    }

    pub fn close(&mut self, id: DrawableId, now: Instant) -> OplResult<()> {
        if id.is_root() {
            return Err(OplError::InvalidArgs);
        }
        self.drawables.remove(&id).ok_or(OplError::DrawNotOpen)?;
        self.stack.retain(|w| *w != id);
        if self.info == Some(id) {
            self.release_info();
        }
        if self.busy == Some(id) {
            self.busy = None;
        }
        self.timers.cancel(TimerKind::BusyShow(id));
        self.timers.cancel(TimerKind::InfoDismiss(id));
        if self.cursor.is_some_and(|c| c.spec.window == id) {
            self.cursor = None;
            self.timers.cancel(TimerKind::CursorFlash);
        }
        self.update_sprite_timer(now);
        self.update_clock_timer(now);
        klog_debug!("drawable {} closed", id);
        Ok(())
    }

    // =========================================================================
    // Z-order and visibility
    // =========================================================================

    /// Move `id` to `rank` (1 = front), clamped to the stack
    pub fn order(&mut self, id: DrawableId, rank: i32) -> OplResult<()> {
        self.window(id)?;
        let mut ranked = self.ranked();
        let Some(pos) = ranked.iter().position(|w| *w == id) else {
            // the info window stays in front
            return Ok(());
        };
        ranked.remove(pos);
        let target = (rank.max(1) as usize - 1).min(ranked.len());
        ranked.insert(target, id);
        self.set_ranked(ranked);
        Ok(())
    }

    pub fn rank(&self, id: DrawableId) -> OplResult<i32> {
        self.window(id)?;
        Ok(self
            .ranked()
            .iter()
            .position(|w| *w == id)
            .map_or(1, |pos| pos as i32 + 1))
    }

    pub fn set_visible(&mut self, id: DrawableId, visible: bool) -> OplResult<()> {
        self.window_mut(id)?.visible = visible;
        if !visible {
            if self.busy == Some(id) {
                self.busy = None;
                self.timers.cancel(TimerKind::BusyShow(id));
            }
            if self.info == Some(id) {
                self.release_info();
            }
        }
        Ok(())
    }

    /// Move a window and optionally resize it
    pub fn set_win(&mut self, id: DrawableId, position: Point, size: Option<Size>) -> OplResult<()> {
        if size.is_some_and(|size| size.is_empty()) {
            self.window(id)?;
            return Err(OplError::InvalidArgs);
        }
        let win = self.window_mut(id)?;
        win.frame.origin = position;
        if let Some(size) = size.filter(|size| *size != win.frame.size) {
            win.resize(size);
        }
        Ok(())
    }

    /// Show `id` after `delay` unless superseded; `None` cancels
    pub fn busy(&mut self, id: Option<DrawableId>, delay: core::time::Duration, now: Instant) -> OplResult<()> {
        if let Some(id) = id {
            self.window(id)?;
        }
        if let Some(prev) = self.busy.take() {
            self.timers.cancel(TimerKind::BusyShow(prev));
        }
        if let Some(id) = id {
            self.busy = Some(id);
            self.timers.arm(TimerKind::BusyShow(id), now + delay, None);
            klog_trace!("busy: {} shows in {:?}", id, delay);
        }
        Ok(())
    }

    /// Show `id` as the info window in front of everything
    pub fn info_print(&mut self, id: Option<DrawableId>, now: Instant) -> OplResult<()> {
        if let Some(id) = id {
            self.window(id)?;
        }
        if let Some(prev) = self.release_info() {
            if let Some(win) = self.drawables.get_mut(&prev).and_then(Drawable::as_window_mut) {
                win.visible = false;
            }
        }
        let Some(id) = id else {
            return Ok(());
        };
        self.window_mut(id)?.visible = true;
        let mut ranked = self.ranked();
        let slot = ranked.iter().position(|w| *w == id).unwrap_or(0);
        self.info_home = InfoHome {
            behind: ranked.get(slot + 1).copied(),
            slot,
        };
        ranked.retain(|w| *w != id);
        self.info = Some(id);
        self.set_ranked(ranked);
        self.timers.arm(TimerKind::InfoDismiss(id), now + self.config.info_dismiss, None);
        Ok(())
    }

    // =========================================================================
    // Cursor, clock and sprites
    // =========================================================================

    fn toggle_cursor(&mut self) {
        let Some(state) = self.cursor.as_mut() else {
            return;
        };
        let Some(win) = self
            .drawables
            .get_mut(&state.spec.window)
            .and_then(Drawable::as_window_mut)
        else {
            return;
        };
        let Some(rect) = state.spec.rect.clip_to(win.canvas.size()) else {
            state.drawn = !state.drawn;
            return;
        };
        let mut planes = vec![&mut win.canvas];
        if state.spec.grey {
            if let Some(grey) = win.grey.as_mut() {
                planes.push(grey);
            }
        }
        for plane in planes {
            for y in rect.y()..rect.max_y() {
                for x in rect.x()..rect.max_x() {
                    plane.xor_pixel(x, y);
                }
            }
        }
        state.drawn = !state.drawn;
    }

    /// Replace the text cursor. The old one is erased first.
    pub fn cursor(&mut self, spec: Option<CursorSpec>, now: Instant) -> OplResult<()> {
        if let Some(spec) = &spec {
            self.window(spec.window)?;
        }
        if self.cursor.is_some_and(|c| c.drawn) {
            self.toggle_cursor();
        }
        self.timers.cancel(TimerKind::CursorFlash);
        self.cursor = spec.map(|spec| CursorState { spec, drawn: false });
        if let Some(spec) = spec {
            self.toggle_cursor();
            if spec.flash {
                let interval = self.config.cursor_flash;
                self.timers.arm(TimerKind::CursorFlash, now + interval, Some(interval));
            }
        }
        Ok(())
    }

    pub fn clock(&mut self, id: DrawableId, info: Option<ClockInfo>, now: Instant) -> OplResult<()> {
        self.window_mut(id)?.clock = info;
        if info.is_some() {
            self.clock_time = SystemTime::now();
        }
        self.update_clock_timer(now);
        Ok(())
    }

    fn update_clock_timer(&mut self, now: Instant) {
        let active = self
            .drawables
            .values()
            .filter_map(Drawable::as_window)
            .any(|w| w.clock.is_some());
        if !active {
            if self.timers.cancel(TimerKind::ClockTick) {
                klog_debug!("clock timer stopped");
            }
        } else if !self.timers.is_armed(TimerKind::ClockTick) {
            let delay = clock::until_next_minute(SystemTime::now());
            self.timers
                .arm(TimerKind::ClockTick, now + delay, Some(core::time::Duration::from_secs(60)));
            klog_debug!("clock timer started");
        }
    }

    pub fn set_sprite(&mut self, id: DrawableId, sprite_id: i32, sprite: Option<Sprite>, now: Instant) -> OplResult<()> {
        let min_frame = self.config.min_frame;
        let win = self.window_mut(id)?;
        match sprite {
            Some(mut sprite) => {
                if sprite.frames.is_empty() {
                    return Err(OplError::InvalidArgs);
                }
                for frame in &mut sprite.frames {
                    frame.duration = frame.duration.max(min_frame);
                }
                win.sprites.insert(sprite_id, SpriteState::new(sprite));
            }
            None => {
                win.sprites.remove(&sprite_id);
            }
        }
        self.update_sprite_timer(now);
        Ok(())
    }

    fn update_sprite_timer(&mut self, now: Instant) {
        let active = self
            .drawables
            .values()
            .filter_map(Drawable::as_window)
            .any(|w| !w.sprites.is_empty());
        if !active {
            if self.timers.cancel(TimerKind::SpriteTick) {
                klog_debug!("sprite timer stopped");
            }
        } else if !self.timers.is_armed(TimerKind::SpriteTick) {
            let tick = self.config.sprite_tick;
            self.timers.arm(TimerKind::SpriteTick, now + tick, Some(tick));
            klog_debug!("sprite timer started");
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// Fire every timer due at `now`
    pub fn run_timers(&mut self, now: Instant) {
        for kind in self.timers.due(now) {
            klog_trace!("timer {:?} fired", kind);
            match kind {
                TimerKind::SpriteTick => {
                    let tick = self.config.sprite_tick;
                    for win in self.drawables.values_mut().filter_map(Drawable::as_window_mut) {
                        for state in win.sprites.values_mut() {
                            state.advance(tick);
                        }
                    }
                }
                TimerKind::ClockTick => self.clock_time = SystemTime::now(),
                TimerKind::CursorFlash => self.toggle_cursor(),
                TimerKind::BusyShow(id) => {
                    if self.busy == Some(id) {
                        self.busy = None;
                    }
                    match self.drawables.get_mut(&id).and_then(Drawable::as_window_mut) {
                        Some(win) => win.visible = true,
                        None => klog_debug!("busy: window {} is gone", id),
                    }
                }
                TimerKind::InfoDismiss(id) => {
                    if self.info == Some(id) {
                        self.release_info();
                        if let Some(win) = self.drawables.get_mut(&id).and_then(Drawable::as_window_mut) {
                            win.visible = false;
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    fn draw_one(&mut self, cmd: &DrawCommand) -> OplResult<()> {
        if !self.contains(cmd.drawable) {
            klog_debug!("draw: no drawable {}", cmd.drawable);
            return Err(OplError::DrawNotOpen);
        }
        let mut sources = BTreeMap::new();
        for id in cmd.sources() {
            let Some(src) = self.drawables.get(&id) else {
                klog_debug!("draw: no source drawable {}", id);
                return Err(OplError::DrawNotOpen);
            };
            sources.insert(id, src.image());
        }
        let ctx = DrawContext {
            sources: &sources,
            glyphs: &*self.glyphs,
        };
        let target = self
            .drawables
            .get_mut(&cmd.drawable)
            .ok_or(OplError::DrawNotOpen)?;
        if cmd.grey_mode.draws_base() {
            graphics::execute(target.base_mut(), cmd, &ctx)?;
        }
        if cmd.grey_mode.draws_grey() {
            if let Some(grey) = target.grey_mut() {
                graphics::execute(grey, cmd, &ctx)?;
            }
        }
        Ok(())
    }

    /// Apply `commands` in order. The first failure stops the batch; commands
    /// already applied stay applied.
    pub fn draw(&mut self, commands: &[DrawCommand]) -> OplResult<()> {
        for (i, cmd) in commands.iter().enumerate() {
            if let Err(err) = self.draw_one(cmd) {
                klog_debug!("draw: batch stopped at {}/{}: {}", i + 1, commands.len(), err);
                return Err(err);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Composited image of one drawable
    pub fn image(&self, id: DrawableId) -> OplResult<Arc<Image>> {
        let drawable = self.drawable(id)?;
        let Some(win) = drawable.as_window().filter(|w| w.has_overlays()) else {
            return Ok(drawable.image());
        };
        let mut out = win.canvas.clone();
        if let Some(grey) = &win.grey {
            let base = win.canvas.raw_pixels();
            let size = win.canvas.size();
            for (i, (&b, &g)) in base.iter().zip(grey.raw_pixels()).enumerate() {
                if !is_ink(b) && is_ink(g) {
                    let (x, y) = (i as i32 % size.width, i as i32 / size.width);
                    out.set_pixel(x, y, GREY_PLANE_COLOR.argb());
                }
            }
        }
        for state in win.sprites.values() {
            self.overlay_sprite(&mut out, state);
        }
        if let Some(info) = &win.clock {
            let minute = clock::minute_of_day(self.clock_time, self.config.utc_offset_minutes);
            clock::draw_clock(&mut out, info, minute, &*self.glyphs);
        }
        Ok(out.image())
    }

    fn overlay_sprite(&self, out: &mut Canvas, state: &SpriteState) {
        let Some(frame) = state.frame() else {
            return;
        };
        // frames whose drawables were closed are skipped
        let Some(bitmap) = self.drawables.get(&frame.bitmap) else {
            return;
        };
        let mask = match frame.mask {
            Some(mask_id) => {
                let Some(mask) = self.drawables.get(&mask_id) else {
                    return;
                };
                let image = mask.image();
                Some(if frame.invert_mask {
                    image.direct_mask()
                } else {
                    image.inverted_mask()
                })
            }
            None => None,
        };
        let image = bitmap.image();
        let at = state.sprite.origin.add(frame.offset);
        for y in 0..image.size.height {
            for x in 0..image.size.width {
                let visible = mask
                    .as_ref()
                    .is_none_or(|m| m.pixel(x, y).is_some_and(is_opaque));
                if !visible {
                    continue;
                }
                if let Some(px) = image.pixel(x, y) {
                    out.set_pixel(at.x + x, at.y + y, px);
                }
            }
        }
    }

    /// The whole screen: visible windows back to front with their shadows,
    /// the info window last
    pub fn screen_image(&self) -> Arc<Image> {
        let mut screen = Canvas::new(self.config.screen, self.config.root_mode);
        let mut order = self.ranked();
        order.reverse();
        order.extend(self.info);
        for id in order {
            let Some(win) = self.drawables.get(&id).and_then(Drawable::as_window) else {
                continue;
            };
            if !win.visible {
                continue;
            }
            if win.shadow > 0 {
                screen.fill_rect(win.frame.translated(win.shadow, win.shadow), SHADOW_COLOR);
            }
            if let Ok(image) = self.image(id) {
                screen.paste(&image, win.frame.origin);
            }
        }
        screen.image()
    }

    pub fn peekline(&self, id: DrawableId, position: Point, count: i32, mode: PeekMode) -> OplResult<Vec<u8>> {
        if count < 0 {
            return Err(OplError::InvalidArgs);
        }
        let image = self.image(id)?;
        Ok(peek::peek_line(&image, position.x, position.y, count, mode))
    }

    pub fn getimg(&self, id: DrawableId, rect: Rect, mode: PeekMode) -> OplResult<Vec<u8>> {
        if rect.width() < 0 || rect.height() < 0 {
            return Err(OplError::InvalidArgs);
        }
        let image = self.image(id)?;
        Ok(peek::get_image(&image, rect, mode))
    }

    pub fn load_font(&self, path: &str) -> OplResult<FontInfo> {
        let font = self.glyphs.load_font(path)?;
        let metrics = self.glyphs.metrics(&font).ok_or(OplError::FontNotLoaded)?;
        klog_debug!("font {} loaded as {:#x}", path, font.uid);
        Ok(FontInfo { font, metrics })
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn graphicsop(&mut self, op: GraphicsOp) -> GraphicsResult {
        self.graphicsop_at(op, Instant::now())
    }

    /// Apply `op` as if issued at `now`
    pub fn graphicsop_at(&mut self, op: GraphicsOp, now: Instant) -> GraphicsResult {
        let name = op.name();
        let res: OplResult<GraphicsResult> = match op {
            GraphicsOp::Close(id) => self.close(id, now).map(|_| GraphicsResult::Nothing),
            GraphicsOp::CreateBitmap { id, size, mode } => {
                self.create_bitmap(id, size, mode).map(|_| GraphicsResult::Nothing)
            }
            GraphicsOp::CreateWindow {
                id,
                frame,
                mode,
                shadow,
            } => self
                .create_window(id, frame, mode, shadow)
                .map(|_| GraphicsResult::Nothing),
            GraphicsOp::LoadFont { path } => self.load_font(&path).map(GraphicsResult::FontMetrics),
            GraphicsOp::Order { id, rank } => self.order(id, rank).map(|_| GraphicsResult::Nothing),
            GraphicsOp::Rank(id) => self.rank(id).map(GraphicsResult::Rank),
            GraphicsOp::Show { id, visible } => {
                self.set_visible(id, visible).map(|_| GraphicsResult::Nothing)
            }
            GraphicsOp::Busy { id, delay } => self.busy(id, delay, now).map(|_| GraphicsResult::Nothing),
            GraphicsOp::InfoPrint(id) => self.info_print(id, now).map(|_| GraphicsResult::Nothing),
            GraphicsOp::SetWin { id, position, size } => {
                self.set_win(id, position, size).map(|_| GraphicsResult::Nothing)
            }
            GraphicsOp::Sprite {
                window,
                sprite_id,
                sprite,
            } => self
                .set_sprite(window, sprite_id, sprite, now)
                .map(|_| GraphicsResult::Nothing),
            GraphicsOp::Clock { window, info } => {
                self.clock(window, info, now).map(|_| GraphicsResult::Nothing)
            }
            GraphicsOp::PeekLine {
                id,
                position,
                count,
                mode,
            } => self.peekline(id, position, count, mode).map(GraphicsResult::Data),
            GraphicsOp::GetImg { id, rect, mode } => self.getimg(id, rect, mode).map(GraphicsResult::Data),
            GraphicsOp::Cursor(spec) => self.cursor(spec, now).map(|_| GraphicsResult::Nothing),
        };
        if let Err(err) = &res {
            klog_debug!("graphicsop {} failed: {}", name, err);
        }
        res.into()
    }

    /// Apply one queued command, replying to its sender
    pub fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Draw { commands, reply } => {
                let res = self.draw(&commands);
                if reply.send(res).is_err() {
                    klog_warn!("draw: caller went away before the reply");
                }
            }
            ServerCommand::Graphics { op, reply } => {
                let res = self.graphicsop(op);
                if reply.send(res).is_err() {
                    klog_warn!("graphicsop: caller went away before the reply");
                }
            }
            ServerCommand::Run(task) => task(self),
            ServerCommand::Shutdown => {}
        }
    }

    pub fn window_count(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use opal_abi::{FontDescriptor, FontMetrics, Glyph, OpType, SpriteFrame};

    struct NoFonts;

    impl GlyphProvider for NoFonts {
        fn metrics(&self, _: &FontDescriptor) -> Option<FontMetrics> {
            None
        }
        fn glyph(&self, _: &FontDescriptor, _: char) -> Option<Glyph> {
            None
        }
        fn load_font(&self, _: &str) -> OplResult<FontDescriptor> {
            Err(OplError::FontNotLoaded)
        }
    }

    fn server() -> WindowServer {
        let config = RuntimeConfig {
            screen: Size::new(64, 32),
            ..RuntimeConfig::default()
        };
        WindowServer::new(config, Arc::new(NoFonts))
    }

    fn fill(id: DrawableId, rect: Rect) -> DrawCommand {
        DrawCommand::new(id, rect.origin, OpType::Fill(rect.size))
    }

    #[test]
    fn root_exists_and_cannot_close() {
        let mut ws = server();
        assert_eq!(ws.rank(DrawableId::ROOT), Ok(1));
        assert_eq!(ws.close(DrawableId::ROOT, Instant::now()), Err(OplError::InvalidArgs));
        assert!(ws.window(DrawableId::ROOT).is_ok_and(|w| w.visible));
    }

    #[test]
    fn create_rejects_duplicates() {
        let mut ws = server();
        ws.create_bitmap(DrawableId(2), Size::new(4, 4), BitmapMode::Gray2).unwrap();
        assert_eq!(
            ws.create_window(DrawableId(2), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0),
            Err(OplError::InvalidArgs)
        );
    }

    #[test]
    fn new_windows_go_in_front_and_order_shifts_minimally() {
        let mut ws = server();
        for id in 2..=4 {
            ws.create_window(DrawableId(id), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
                .unwrap();
        }
        // stack: 4 3 2 1
        assert_eq!(ws.rank(DrawableId(4)), Ok(1));
        ws.order(DrawableId(2), 1).unwrap();
        assert_eq!(ws.rank(DrawableId(2)), Ok(1));
        assert_eq!(ws.rank(DrawableId(4)), Ok(2));
        assert_eq!(ws.rank(DrawableId(3)), Ok(3));
        assert_eq!(ws.rank(DrawableId::ROOT), Ok(4));
        ws.order(DrawableId(2), 99).unwrap();
        assert_eq!(ws.rank(DrawableId(2)), Ok(4));
        assert_eq!(ws.rank(DrawableId::ROOT), Ok(3));
    }

    #[test]
    fn window_ops_on_bitmaps_fail() {
        let mut ws = server();
        ws.create_bitmap(DrawableId(5), Size::new(4, 4), BitmapMode::Gray2).unwrap();
        assert_eq!(ws.rank(DrawableId(5)), Err(OplError::InvalidWindow));
        assert_eq!(ws.set_visible(DrawableId(5), true), Err(OplError::InvalidWindow));
        assert_eq!(ws.rank(DrawableId(9)), Err(OplError::DrawNotOpen));
    }

    #[test]
    fn failed_lookup_stops_batch_but_keeps_applied_commands() {
        let mut ws = server();
        let batch = [
            fill(DrawableId::ROOT, Rect::new(0, 0, 2, 2)),
            fill(DrawableId(7), Rect::new(0, 0, 2, 2)),
            fill(DrawableId::ROOT, Rect::new(4, 4, 2, 2)),
        ];
        assert_eq!(ws.draw(&batch), Err(OplError::DrawNotOpen));
        let root = ws.drawable(DrawableId::ROOT).unwrap().base();
        assert!(root.is_marked(1, 1));
        assert!(!root.is_marked(5, 5));
    }

    #[test]
    fn grey_plane_shows_under_white_base() {
        let mut ws = server();
        let grey = fill(DrawableId::ROOT, Rect::new(0, 0, 4, 1)).with_grey_mode(opal_abi::GreyMode::GreyOnly);
        ws.draw(&[grey, fill(DrawableId::ROOT, Rect::new(0, 0, 1, 1))]).unwrap();
        let image = ws.image(DrawableId::ROOT).unwrap();
        assert_eq!(image.pixel(0, 0), Some(Color::BLACK.argb()));
        assert_eq!(image.pixel(1, 0), Some(GREY_PLANE_COLOR.argb()));
        assert_eq!(image.pixel(5, 0), Some(Color::WHITE.argb()));
    }

    #[test]
    fn busy_shows_after_delay_and_is_superseded() {
        let mut ws = server();
        let t0 = Instant::now();
        for id in [3, 4] {
            ws.create_window(DrawableId(id), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
                .unwrap();
        }
        ws.busy(Some(DrawableId(3)), Duration::from_millis(200), t0).unwrap();
        ws.busy(Some(DrawableId(4)), Duration::from_millis(200), t0).unwrap();
        ws.run_timers(t0 + Duration::from_millis(300));
        assert!(!ws.window(DrawableId(3)).unwrap().visible);
        assert!(ws.window(DrawableId(4)).unwrap().visible);
    }

    #[test]
    fn info_window_dismisses_itself() {
        let mut ws = server();
        let t0 = Instant::now();
        ws.create_window(DrawableId(2), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
            .unwrap();
        ws.create_window(DrawableId(3), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
            .unwrap();
        ws.info_print(Some(DrawableId(2)), t0).unwrap();
        assert!(ws.window(DrawableId(2)).unwrap().visible);
        // rank accounting skips the info window
        assert_eq!(ws.rank(DrawableId(3)), Ok(1));
        ws.run_timers(t0 + Duration::from_millis(2000));
        assert!(!ws.window(DrawableId(2)).unwrap().visible);
        assert_eq!(ws.rank(DrawableId(3)), Ok(1));
        assert_eq!(ws.rank(DrawableId(2)), Ok(2));
    }

    #[test]
    fn dismissed_info_window_returns_to_its_rank() {
        let mut ws = server();
        let t0 = Instant::now();
        for id in [2, 3, 4] {
            ws.create_window(DrawableId(id), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
                .unwrap();
        }
        // front to back: 4, 3, 2, root
        ws.info_print(Some(DrawableId(3)), t0).unwrap();
        assert_eq!(ws.rank(DrawableId(2)), Ok(2));
        ws.order(DrawableId(4), 3).unwrap();
        ws.run_timers(t0 + Duration::from_millis(2000));

        // back in front of the window it was ranked before
        assert!(!ws.window(DrawableId(3)).unwrap().visible);
        assert_eq!(ws.rank(DrawableId(3)), Ok(1));
        assert_eq!(ws.rank(DrawableId(2)), Ok(2));
        assert_eq!(ws.rank(DrawableId::ROOT), Ok(3));
        assert_eq!(ws.rank(DrawableId(4)), Ok(4));
    }

    #[test]
    fn repeated_info_print_hides_the_previous_window() {
        let mut ws = server();
        let t0 = Instant::now();
        for id in [2, 3] {
            ws.create_window(DrawableId(id), Rect::new(0, 0, 4, 4), BitmapMode::Gray2, 0)
                .unwrap();
        }
        ws.info_print(Some(DrawableId(3)), t0).unwrap();
        ws.info_print(Some(DrawableId(2)), t0 + Duration::from_millis(500)).unwrap();

        assert!(!ws.window(DrawableId(3)).unwrap().visible);
        assert!(!ws.timer_armed(TimerKind::InfoDismiss(DrawableId(3))));
        assert!(ws.timer_armed(TimerKind::InfoDismiss(DrawableId(2))));
        assert_eq!(ws.rank(DrawableId(3)), Ok(1));
        assert_eq!(ws.rank(DrawableId::ROOT), Ok(2));

        ws.info_print(None, t0 + Duration::from_millis(600)).unwrap();
        assert_eq!(ws.rank(DrawableId(3)), Ok(1));
        assert_eq!(ws.rank(DrawableId(2)), Ok(2));
        assert!(!ws.window(DrawableId(2)).unwrap().visible);
    }

    #[test]
    fn failed_set_win_leaves_window_untouched() {
        let mut ws = server();
        ws.create_window(DrawableId(2), Rect::new(1, 2, 8, 4), BitmapMode::Gray2, 0)
            .unwrap();
        assert_eq!(
            ws.set_win(DrawableId(2), Point::new(20, 10), Some(Size::new(0, 4))),
            Err(OplError::InvalidArgs)
        );
        assert_eq!(ws.window(DrawableId(2)).unwrap().frame, Rect::new(1, 2, 8, 4));
        assert_eq!(
            ws.set_win(DrawableId(9), Point::ZERO, Some(Size::new(0, 0))),
            Err(OplError::DrawNotOpen)
        );

        ws.set_win(DrawableId(2), Point::new(20, 10), None).unwrap();
        assert_eq!(ws.window(DrawableId(2)).unwrap().frame, Rect::new(20, 10, 8, 4));
    }

    #[test]
    fn bitmap_loads_from_packed_samples() {
        let mut ws = server();
        let packed = Bitmap {
            width: 8,
            height: 1,
            stride: 4,
            mode: BitmapMode::Gray2,
            data: vec![0b0000_0101, 0, 0, 0],
        };
        ws.load_bitmap(DrawableId(4), &packed).unwrap();
        let canvas = ws.drawable(DrawableId(4)).unwrap().base();
        assert!(!canvas.is_marked(0, 0));
        assert!(canvas.is_marked(1, 0));
        assert_eq!(ws.save_bitmap(DrawableId(4)), Ok(packed.clone()));

        let short = Bitmap {
            data: vec![0],
            ..packed
        };
        assert_eq!(ws.load_bitmap(DrawableId(5), &short), Err(OplError::InvalidArgs));
        assert!(!ws.contains(DrawableId(5)));
    }

    #[test]
    fn sprite_timer_runs_only_while_sprites_exist() {
        let mut ws = server();
        let t0 = Instant::now();
        ws.create_bitmap(DrawableId(8), Size::new(2, 2), BitmapMode::Gray2).unwrap();
        let sprite = Sprite {
            origin: Point::new(1, 1),
            frames: vec![SpriteFrame {
                offset: Point::ZERO,
                bitmap: DrawableId(8),
                mask: None,
                invert_mask: false,
                duration: Duration::from_millis(1),
            }],
        };
        ws.set_sprite(DrawableId::ROOT, 1, Some(sprite), t0).unwrap();
        assert!(ws.timer_armed(TimerKind::SpriteTick));
        let frame = &ws.window(DrawableId::ROOT).unwrap().sprites[&1].sprite.frames[0];
        assert_eq!(frame.duration, Duration::from_millis(100));
        ws.set_sprite(DrawableId::ROOT, 1, None, t0).unwrap();
        assert!(!ws.timer_armed(TimerKind::SpriteTick));
    }

    #[test]
    fn sprite_with_closed_bitmap_is_skipped() {
        let mut ws = server();
        let t0 = Instant::now();
        ws.create_bitmap(DrawableId(8), Size::new(2, 2), BitmapMode::Gray2).unwrap();
        ws.draw(&[fill(DrawableId(8), Rect::new(0, 0, 2, 2))]).unwrap();
        let sprite = Sprite {
            origin: Point::new(1, 1),
            frames: vec![SpriteFrame {
                offset: Point::ZERO,
                bitmap: DrawableId(8),
                mask: None,
                invert_mask: false,
                duration: Duration::from_millis(100),
            }],
        };
        ws.set_sprite(DrawableId::ROOT, 1, Some(sprite), t0).unwrap();
        assert!(ws.image(DrawableId::ROOT).unwrap().pixel(1, 1).is_some_and(is_ink));
        ws.close(DrawableId(8), t0).unwrap();
        assert!(!ws.image(DrawableId::ROOT).unwrap().pixel(1, 1).is_some_and(is_ink));
    }

    #[test]
    fn cursor_is_erased_before_replacement() {
        let mut ws = server();
        let t0 = Instant::now();
        let before = ws.drawable(DrawableId::ROOT).unwrap().raw_pixels().to_vec();
        let spec = CursorSpec {
            window: DrawableId::ROOT,
            rect: Rect::new(2, 2, 2, 8),
            flash: false,
            grey: false,
        };
        ws.cursor(Some(spec), t0).unwrap();
        assert!(ws.drawable(DrawableId::ROOT).unwrap().base().is_marked(2, 2));
        ws.cursor(Some(CursorSpec { rect: Rect::new(10, 2, 2, 8), ..spec }), t0)
            .unwrap();
        assert!(!ws.drawable(DrawableId::ROOT).unwrap().base().is_marked(2, 2));
        ws.cursor(None, t0).unwrap();
        assert_eq!(ws.drawable(DrawableId::ROOT).unwrap().raw_pixels(), before.as_slice());
    }

    #[test]
    fn screen_draws_shadow_behind_window() {
        let mut ws = server();
        ws.create_window(DrawableId(2), Rect::new(4, 4, 4, 4), BitmapMode::Gray2, 2)
            .unwrap();
        ws.set_visible(DrawableId(2), true).unwrap();
        let screen = ws.screen_image();
        assert_eq!(screen.pixel(5, 5), Some(Color::WHITE.argb()));
        assert_eq!(screen.pixel(9, 9), Some(SHADOW_COLOR.argb()));
    }

    #[test]
    fn graphicsop_reports_errors_as_results() {
        let mut ws = server();
        let res = ws.graphicsop(GraphicsOp::Rank(DrawableId(42)));
        assert_eq!(res, GraphicsResult::Error(OplError::DrawNotOpen));
        let res = ws.graphicsop(GraphicsOp::LoadFont { path: "x.fon".into() });
        assert_eq!(res, GraphicsResult::Error(OplError::FontNotLoaded));
    }
}
