//! Clock overlays.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use opal_abi::{ClockFace, ClockInfo, Color, GlyphProvider, Mode, Point, TextKind, TextOp, TextStyle};
use opal_lib::klog_debug;

use crate::canvas::Canvas;
use crate::graphics::{Painter, Pen};
use crate::text;

pub const ANALOG_RADIUS: i32 = 20;

const MINUTE: Duration = Duration::from_secs(60);
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Local minute of the day, 0..1440
pub fn minute_of_day(time: SystemTime, utc_offset_minutes: i32) -> u32 {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let local = secs / 60 + utc_offset_minutes as i64;
    local.rem_euclid(MINUTES_PER_DAY) as u32
}

/// Time left until the next wall-clock minute boundary
pub fn until_next_minute(time: SystemTime) -> Duration {
    let since = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    let into = Duration::from_nanos((since.as_nanos() % MINUTE.as_nanos()) as u64);
    MINUTE - into
}

fn pen() -> Pen {
    Pen {
        color: Color::BLACK,
        bg: Color::WHITE,
        mode: Mode::Set,
        width: 1,
    }
}

fn hand_end(center: Point, fraction: f64, length: f64) -> Point {
    let angle = fraction * core::f64::consts::TAU;
    Point::new(
        center.x + (angle.sin() * length).round() as i32,
        center.y - (angle.cos() * length).round() as i32,
    )
}

/// Draw `info` showing `minute` (of the day) onto `canvas`
pub fn draw_clock(canvas: &mut Canvas, info: &ClockInfo, minute: u32, glyphs: &dyn GlyphProvider) {
    let (hours, minutes) = (minute / 60, minute % 60);
    let mut painter = Painter::new(canvas, pen());
    match info.face {
        ClockFace::Digital => {
            let Some(metrics) = glyphs.metrics(&info.font) else {
                klog_debug!("clock: font {:#x} not loaded", info.font.uid);
                return;
            };
            let op = TextOp {
                text: format!("{hours:02}:{minutes:02}"),
                font: info.font,
                style: TextStyle::empty(),
                kind: TextKind::Print,
            };
            let baseline = info.position.offset(0, metrics.ascent);
            if let Err(err) = text::draw_text(&mut painter, baseline, &op, glyphs) {
                klog_debug!("clock: text failed: {}", err);
            }
        }
        ClockFace::Analog => {
            let center = info.position.offset(ANALOG_RADIUS, ANALOG_RADIUS);
            painter.circle(center, ANALOG_RADIUS, false);
            let r = ANALOG_RADIUS as f64;
            let hour_fraction = ((hours % 12) * 60 + minutes) as f64 / 720.0;
            painter.line(center, hand_end(center, hour_fraction, r * 0.5));
            painter.line(center, hand_end(center, minutes as f64 / 60.0, r * 0.8));
        }
    }
}
