//! System borders drawn from small nine-slice templates.
//!
//! Corner cells are kept at their natural size, the middle row and column are
//! stretched to fit and the centre stays untouched.

use opal_abi::{BorderKind, Color, Mode, Rect};

use crate::canvas::is_ink;
use crate::graphics::Painter;

const SINGLE: &[&str] = &["BBB", "B.B", "BBB"];
const DOUBLE: &[&str] = &["BBBBB", "BBBBB", "BB.BB", "BBBBB", "BBBBB"];
const SHADOWED: &[&str] = &["BBBB.", "B..BB", "B..BB", "BBBBB", ".BBBB"];
const SUNKEN: &[&str] = &["DDDDW", "DBBLW", "DB.LW", "DLLLW", "WWWWW"];
const RAISED: &[&str] = &["LLLLB", "LWWDB", "LW.DB", "LDDDB", "BBBBB"];
const BAR: &[&str] = &["DDD", "D.D", "DDD"];

fn template(kind: BorderKind) -> &'static [&'static str] {
    match kind {
        BorderKind::SinglePixel => SINGLE,
        BorderKind::DoublePixel => DOUBLE,
        BorderKind::Shadowed => SHADOWED,
        BorderKind::Sunken => SUNKEN,
        BorderKind::Raised => RAISED,
        BorderKind::Bar => BAR,
    }
}

fn cell_color(cell: u8) -> Option<Color> {
    match cell {
        b'B' => Some(Color::BLACK),
        b'D' => Some(Color::DARK_GREY),
        b'L' => Some(Color::LIGHT_GREY),
        b'W' => Some(Color::WHITE),
        _ => None,
    }
}

/// Template index for position `pos` along an edge of length `len`
#[inline]
fn slice(pos: i32, len: i32, cells: i32) -> usize {
    let middle = cells / 2;
    let tail = cells - 1 - middle;
    let idx = if pos < middle {
        pos
    } else if pos >= len - tail {
        cells - (len - pos)
    } else {
        middle
    };
    idx as usize
}

pub fn draw_border(painter: &mut Painter<'_>, rect: Rect, kind: BorderKind) {
    if rect.is_empty() {
        return;
    }
    let rows = template(kind);
    let cells_y = rows.len() as i32;
    let cells_x = rows[0].len() as i32;
    let pen = painter.pen();
    let canvas = painter.canvas();
    for y in 0..rect.height() {
        let row = rows[slice(y, rect.height(), cells_y)].as_bytes();
        for x in 0..rect.width() {
            let Some(color) = cell_color(row[slice(x, rect.width(), cells_x)]) else {
                continue;
            };
            let (px, py) = (rect.x() + x, rect.y() + y);
            match pen.mode {
                Mode::Set | Mode::Replace => canvas.set_pixel(px, py, color.argb()),
                Mode::Clear => canvas.set_pixel(px, py, pen.bg.argb()),
                Mode::Invert if is_ink(color.argb()) => canvas.xor_pixel(px, py),
                Mode::Invert => {}
            }
        }
    }
}
