//! Text rendering from pre-rasterised glyphs.
//!
//! Plain print only paints a background for inverse text or replace mode and
//! underlines up to the last non-space character one row below the baseline.
//! Extended print always paints its box and underlines the whole string two
//! rows below the baseline.

use opal_abi::{
    ExtendedBorder, FontMetrics, GlyphProvider, Mode, OplError, OplResult, Point, Rect, Size,
    TextAlign, TextKind, TextOp, TextStyle,
};

use crate::canvas::{Image, is_ink};
use crate::codec;
use crate::graphics::{Painter, Pen};

struct PlacedGlyph {
    x: i32,
    image: Image,
}

struct Layout {
    glyphs: Vec<PlacedGlyph>,
    width: i32,
    /// Width up to the end of the last non-space character
    trimmed_width: i32,
}

fn layout(op: &TextOp, metrics: &FontMetrics, provider: &dyn GlyphProvider) -> OplResult<Layout> {
    let bold = op.style.contains(TextStyle::BOLD);
    let mono = op.style.contains(TextStyle::MONO);
    let mut glyphs = Vec::with_capacity(op.text.len());
    let mut x = 0;
    let mut trimmed_width = 0;
    for ch in op.text.chars() {
        let Some(glyph) = provider.glyph(&op.font, ch) else {
            continue;
        };
        let mut advance = if mono { metrics.max_width } else { glyph.advance };
        if bold {
            advance += 1;
        }
        let image = Image {
            size: glyph.bitmap.size(),
            pixels: codec::decode(&glyph.bitmap)?,
        };
        glyphs.push(PlacedGlyph { x, image });
        x += advance;
        if ch != ' ' {
            trimmed_width = x;
        }
    }
    Ok(Layout {
        glyphs,
        width: x,
        trimmed_width,
    })
}

fn draw_glyphs(painter: &mut Painter<'_>, layout: &Layout, left: i32, top: i32, style: TextStyle, ascent: i32) {
    let scale = if style.contains(TextStyle::DOUBLE_HEIGHT) { 2 } else { 1 };
    let italic = style.contains(TextStyle::ITALIC);
    let bold = style.contains(TextStyle::BOLD);
    for glyph in &layout.glyphs {
        for row in 0..glyph.image.size.height {
            let slant = if italic { (ascent - row) / 4 } else { 0 };
            for col in 0..glyph.image.size.width {
                let Some(px) = glyph.image.pixel(col, row) else {
                    continue;
                };
                if !is_ink(px) {
                    continue;
                }
                let x = left + glyph.x + col + slant;
                for dy in 0..scale {
                    let y = top + row * scale + dy;
                    painter.plot(x, y);
                    if bold {
                        painter.plot(x + 1, y);
                    }
                }
            }
        }
    }
}

fn paint_background(painter: &mut Painter<'_>, rect: Rect, paper: Pen, rounded: bool) {
    let mut bg = Painter::new(painter.canvas(), paper);
    if !rounded || rect.width() < 2 || rect.height() < 2 {
        bg.fill(rect);
        return;
    }
    let (x0, y0, x1, y1) = (rect.x(), rect.y(), rect.max_x() - 1, rect.max_y() - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if (x == x0 || x == x1) && (y == y0 || y == y1) {
                continue;
            }
            bg.plot(x, y);
        }
    }
}

/// Draw `op` with the left end of its baseline at `origin`.
pub fn draw_text(painter: &mut Painter<'_>, origin: Point, op: &TextOp, provider: &dyn GlyphProvider) -> OplResult<()> {
    let metrics = provider.metrics(&op.font).ok_or(OplError::FontNotLoaded)?;
    let layout = layout(op, &metrics, provider)?;
    let scale = if op.style.contains(TextStyle::DOUBLE_HEIGHT) { 2 } else { 1 };
    let ascent = metrics.ascent * scale;
    let height = metrics.height * scale;
    let top = origin.y - ascent;

    let pen = painter.pen();
    let mut inverse = op.style.contains(TextStyle::INVERSE);
    let rounded = matches!(
        op.kind,
        TextKind::Extended {
            border: ExtendedBorder::InverseRounded,
            ..
        }
    );
    if matches!(
        op.kind,
        TextKind::Extended {
            border: ExtendedBorder::Inverse | ExtendedBorder::InverseRounded,
            ..
        }
    ) {
        inverse = !inverse;
    }
    let (ink, paper) = if inverse { (pen.bg, pen.color) } else { (pen.color, pen.bg) };
    let ink_pen = Pen {
        color: ink,
        bg: paper,
        width: 1,
        ..pen
    };
    let paper_pen = Pen {
        color: paper,
        bg: ink,
        width: 1,
        mode: if pen.mode == Mode::Invert {
            Mode::Invert
        } else {
            Mode::Set
        },
    };

    let (text_left, underline_y, underline_len) = match op.kind {
        TextKind::Print => {
            if inverse || pen.mode == Mode::Replace {
                let rect = Rect::from_parts(Point::new(origin.x, top), Size::new(layout.width, height));
                paint_background(painter, rect, paper_pen, false);
            }
            (origin.x, origin.y + 1, layout.trimmed_width)
        }
        TextKind::Extended {
            width,
            align,
            border,
            margin,
        } => {
            let box_width = if width > 0 {
                width
            } else {
                layout.width + 2 * margin
            };
            let rect = Rect::from_parts(Point::new(origin.x, top), Size::new(box_width, height));
            paint_background(painter, rect, paper_pen, rounded);
            if border == ExtendedBorder::Plain {
                Painter::new(painter.canvas(), ink_pen).draw_box(rect.origin, rect.size);
            }
            let left = match align {
                TextAlign::Left => rect.x() + margin,
                TextAlign::Right => rect.max_x() - margin - layout.width,
                TextAlign::Center => rect.x() + (box_width - layout.width) / 2,
            };
            (left, origin.y + 2, layout.width)
        }
    };

    let mut ink_painter = Painter::new(painter.canvas(), ink_pen);
    draw_glyphs(&mut ink_painter, &layout, text_left, top, op.style, metrics.ascent);
    if op.style.contains(TextStyle::UNDERLINE) {
        for x in text_left..text_left + underline_len {
            ink_painter.plot(x, underline_y);
        }
    }
    Ok(())
}
