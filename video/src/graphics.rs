//! Drawing primitives over a single canvas plane.
//!
//! `Painter` applies one pen to one plane; `execute` maps a draw command
//! onto it. Coordinates are in the plane's own space and every plot is
//! clipped by the canvas, so primitives may extend past its edges.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use opal_abi::{
    Color, DrawCommand, DrawableId, GlyphProvider, Mode, OpType, OplError, OplResult, Point, Rect,
    Size,
};

use crate::blit;
use crate::border;
use crate::canvas::Canvas;
use crate::canvas::Image;
use crate::text;

/// Everything a command may read besides its target.
pub struct DrawContext<'a> {
    /// Snapshots of the drawables named by `DrawCommand::sources`
    pub sources: &'a BTreeMap<DrawableId, Arc<Image>>,
    pub glyphs: &'a dyn GlyphProvider,
}

impl DrawContext<'_> {
    pub fn source(&self, id: DrawableId) -> OplResult<&Arc<Image>> {
        self.sources.get(&id).ok_or(OplError::DrawNotOpen)
    }
}

/// Ink, background and compositing mode of one command
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pen {
    pub color: Color,
    pub bg: Color,
    pub mode: Mode,
    pub width: i32,
}

impl Pen {
    pub fn from_command(cmd: &DrawCommand) -> Self {
        Self {
            color: cmd.color,
            bg: cmd.bg_color,
            mode: cmd.mode,
            width: cmd.pen_width.max(1),
        }
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    /// Inclusive offsets a pen block spans around a plotted pixel
    #[inline]
    pub fn block_span(&self) -> (i32, i32) {
        if self.mode == Mode::Invert {
            return (0, 0);
        }
        let pw = self.width;
        (pw / 2, pw - 1 - pw / 2)
    }
}

/// Pixel writer applying one pen's mode to a canvas
pub struct Painter<'a> {
    canvas: &'a mut Canvas,
    pen: Pen,
}

impl<'a> Painter<'a> {
    pub fn new(canvas: &'a mut Canvas, pen: Pen) -> Self {
        Self { canvas, pen }
    }

    #[inline]
    pub fn pen(&self) -> Pen {
        self.pen
    }

    pub fn canvas(&mut self) -> &mut Canvas {
        self.canvas
    }

    /// One pixel, no pen expansion
    #[inline]
    pub fn plot(&mut self, x: i32, y: i32) {
        match self.pen.mode {
            Mode::Set | Mode::Replace => self.canvas.set_pixel(x, y, self.pen.color.argb()),
            Mode::Clear => self.canvas.set_pixel(x, y, self.pen.bg.argb()),
            Mode::Invert => self.canvas.xor_pixel(x, y),
        }
    }

    /// One pixel expanded to the pen's block
    pub fn plot_pen(&mut self, x: i32, y: i32) {
        let (before, after) = self.pen.block_span();
        if before == 0 && after == 0 {
            self.plot(x, y);
            return;
        }
        for py in y - before..=y + after {
            for px in x - before..=x + after {
                self.plot(px, py);
            }
        }
    }

    /// Apply a source pixel. Set draws ink only, Clear erases where the
    /// source has ink, Invert flips where it has ink, Replace copies all.
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, src: u32) {
        let ink = crate::canvas::is_ink(src);
        match self.pen.mode {
            Mode::Set if ink => self.canvas.set_pixel(x, y, src),
            Mode::Replace => self.canvas.set_pixel(x, y, src),
            Mode::Clear if ink => self.canvas.set_pixel(x, y, self.pen.bg.argb()),
            Mode::Invert if ink => self.canvas.xor_pixel(x, y),
            _ => {}
        }
    }

    pub fn line(&mut self, from: Point, to: Point) {
        for p in line_points(from, to) {
            self.plot_pen(p.x, p.y);
        }
    }

    /// Outline of a `size` box; every perimeter pixel is visited once
    pub fn draw_box(&mut self, origin: Point, size: Size) {
        if size.is_empty() {
            return;
        }
        if size.width == 1 || size.height == 1 {
            for y in origin.y..origin.y + size.height {
                for x in origin.x..origin.x + size.width {
                    self.plot_pen(x, y);
                }
            }
            return;
        }
        let tl = origin;
        let tr = origin.offset(size.width - 1, 0);
        let br = origin.offset(size.width - 1, size.height - 1);
        let bl = origin.offset(0, size.height - 1);
        self.line(tl, tr);
        self.line(tr, br);
        self.line(br, bl);
        self.line(bl, tl);
    }

    pub fn fill(&mut self, rect: Rect) {
        let Some(clip) = rect.intersection(&self.canvas.bounds()) else {
            return;
        };
        match self.pen.mode {
            Mode::Set | Mode::Replace => self.canvas.fill_rect(clip, self.pen.color),
            Mode::Clear => self.canvas.fill_rect(clip, self.pen.bg),
            Mode::Invert => {
                for y in clip.y()..clip.max_y() {
                    for x in clip.x()..clip.max_x() {
                        self.canvas.xor_pixel(x, y);
                    }
                }
            }
        }
    }

    /// XOR a rectangle, leaving its four corner pixels untouched
    pub fn invert_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let (x0, y0, x1, y1) = (rect.x(), rect.y(), rect.max_x() - 1, rect.max_y() - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let corner = (x == x0 || x == x1) && (y == y0 || y == y1);
                if !corner || (x0 == x1 && y0 == y1) {
                    self.canvas.xor_pixel(x, y);
                }
            }
        }
    }

    pub fn ellipse(&mut self, center: Point, h_radius: i32, v_radius: i32, fill: bool) {
        if h_radius < 0 || v_radius < 0 {
            return;
        }
        // offsets from the centre whose plots can still land on the canvas
        let (before, after) = if fill { (0, 0) } else { self.pen.block_span() };
        let reach = |centre: i32, extent: i32| {
            let lo = -(centre as i64) - before as i64;
            (lo, lo + before as i64 + extent as i64 - 1 + after as i64)
        };
        let size = self.canvas.size();
        let (row_lo, row_hi) = reach(center.y, size.height);
        let (col_lo, col_hi) = reach(center.x, size.width);

        let span = |dy: i32| ellipse_half_width(h_radius, v_radius, dy);
        for dy in clip_span(-v_radius, v_radius, row_lo, row_hi) {
            let hw = span(dy);
            if hw < 0 {
                continue;
            }
            let y = center.y + dy;
            if fill {
                for dx in clip_span(-hw, hw, col_lo, col_hi) {
                    self.plot(center.x + dx, y);
                }
                continue;
            }
            let above = dy.checked_sub(1).map_or(-1, span);
            let below = dy.checked_add(1).map_or(-1, span);
            let lo = hw.min(above.min(below) + 1).max(0);
            for dx in clip_span(lo, hw, col_lo, col_hi) {
                self.plot_pen(center.x + dx, y);
            }
            for dx in clip_span(lo.max(1), hw, -col_hi, -col_lo) {
                self.plot_pen(center.x - dx, y);
            }
        }
    }

    pub fn circle(&mut self, center: Point, radius: i32, fill: bool) {
        self.ellipse(center, radius, radius, fill);
    }
}

/// Pixels of a line from `from` towards `to`.
///
/// The scan axis is the one with the larger extent. The start pixel is always
/// included and the end pixel never is; a zero-length line yields its start.
pub fn line_points(from: Point, to: Point) -> Vec<Point> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return vec![from];
    }

    let x_major = dx.abs() >= dy.abs();
    let (dscan, dinc) = if x_major {
        (dx.abs(), dy.abs())
    } else {
        (dy.abs(), dx.abs())
    };
    let (sx, sy) = (dx.signum(), dy.signum());

    let mut points = Vec::with_capacity(dscan as usize);
    let mut p = from;
    let mut d = 2 * dinc - dscan;
    for _ in 0..dscan {
        points.push(p);
        if d > 0 {
            if x_major {
                p.y += sy;
            } else {
                p.x += sx;
            }
            d += 2 * dinc - 2 * dscan;
        } else {
            d += 2 * dinc;
        }
        if x_major {
            p.x += sx;
        } else {
            p.y += sy;
        }
    }
    points
}

/// Largest `x >= 0` inside the ellipse on row `dy`, or -1 outside it
pub fn ellipse_half_width(h_radius: i32, v_radius: i32, dy: i32) -> i32 {
    if dy.abs() > v_radius {
        return -1;
    }
    if v_radius == 0 {
        return h_radius;
    }
    let (a, b, y) = (h_radius as u128, v_radius as u128, dy.unsigned_abs() as u128);
    let limit = a * a * (b * b - y * y) / (b * b);
    limit.isqrt() as i32
}

/// `lo..=hi` narrowed to `min..=max`; empty when the two do not meet
fn clip_span(lo: i32, hi: i32, min: i64, max: i64) -> RangeInclusive<i32> {
    let lo = (lo as i64).max(min);
    let hi = (hi as i64).min(max);
    if lo > hi {
        return RangeInclusive::new(1, 0);
    }
    lo as i32..=hi as i32
}

/// Apply one command to one plane.
pub fn execute(canvas: &mut Canvas, cmd: &DrawCommand, ctx: &DrawContext<'_>) -> OplResult<()> {
    let pen = Pen::from_command(cmd);
    let origin = cmd.origin;
    match &cmd.op {
        OpType::Fill(size) => Painter::new(canvas, pen).fill(Rect::from_parts(origin, *size)),
        OpType::Circle { radius, fill } => {
            Painter::new(canvas, pen).circle(origin, *radius, *fill)
        }
        OpType::Ellipse {
            h_radius,
            v_radius,
            fill,
        } => Painter::new(canvas, pen).ellipse(origin, *h_radius, *v_radius, *fill),
        OpType::Line(to) => Painter::new(canvas, pen).line(origin, *to),
        OpType::Box(size) => Painter::new(canvas, pen).draw_box(origin, *size),
        OpType::Invert(size) => {
            Painter::new(canvas, pen).invert_rect(Rect::from_parts(origin, *size))
        }
        OpType::BitBlt(bitmap) => blit::bitblt(&mut Painter::new(canvas, pen), origin, bitmap)?,
        OpType::Copy { src, mask } => {
            let image = ctx.source(src.drawable)?.clone();
            let mask = match mask {
                Some(m) => Some((ctx.source(m.drawable)?.clone(), m.rect.origin)),
                None => None,
            };
            blit::copy(
                &mut Painter::new(canvas, pen),
                &image,
                src.rect,
                origin,
                mask.as_ref().map(|(img, at)| (&**img, *at)),
            );
        }
        OpType::MCopy { src, rects, points } => {
            let image = ctx.source(*src)?.clone();
            blit::mcopy(&mut Painter::new(canvas, pen), &image, rects, points)?;
        }
        OpType::Pattern { src, size } => {
            let rect = Rect::from_parts(origin, *size);
            blit::pattern(&mut Painter::new(canvas, pen), *src, rect, ctx)?;
        }
        OpType::Scroll { dx, dy, rect } => blit::scroll(canvas, pen.bg, *dx, *dy, *rect),
        OpType::Text(op) => text::draw_text(&mut Painter::new(canvas, pen), origin, op, ctx.glyphs)?,
        OpType::Border { rect, kind } => border::draw_border(&mut Painter::new(canvas, pen), *rect, *kind),
    }
    Ok(())
}
