//! Window server scenarios, driven with explicit instants.

use std::time::{Duration, Instant};

use opal_abi::{
    BitmapMode, Color, CopySource, CursorSpec, DrawCommand, DrawableId, GraphicsOp, GraphicsResult, Mode, OpType,
    OplError, PeekMode, Point, Rect, Size, Sprite, SpriteFrame, TextKind, TextOp, TextStyle,
};
use opal_video::{TimerKind, WindowServer};

use crate::fixtures::{FIXED_FONT, FIXED_FONT_PATH, test_server};

const WIN: DrawableId = DrawableId(2);

fn server_with_window(frame: Rect, mode: BitmapMode) -> WindowServer {
    let mut ws = test_server();
    ws.create_window(WIN, frame, mode, 0).unwrap();
    ws
}

fn base_pixels(ws: &WindowServer, id: DrawableId) -> Vec<u32> {
    ws.drawable(id).unwrap().raw_pixels().to_vec()
}

fn marked(ws: &WindowServer, id: DrawableId, x: i32, y: i32) -> bool {
    ws.drawable(id).unwrap().base().is_marked(x, y)
}

#[test]
fn line_sets_start_and_never_end() {
    let mut ws = server_with_window(Rect::new(0, 0, 100, 50), BitmapMode::Gray4);
    ws.draw(&[DrawCommand::new(WIN, Point::ZERO, OpType::Line(Point::new(10, 0)))])
        .unwrap();
    assert!(marked(&ws, WIN, 0, 0));
    assert!(!marked(&ws, WIN, 10, 0));
    for x in 1..10 {
        assert!(marked(&ws, WIN, x, 0), "pixel {} not set", x);
    }
}

#[test]
fn wide_pen_thickens_lines_around_the_path() {
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    let line = DrawCommand::new(WIN, Point::new(5, 5), OpType::Line(Point::new(15, 5)))
        .with_colors(Color::DARK_GREY, Color::WHITE)
        .with_pen_width(3);
    ws.draw(&[line]).unwrap();
    for y in 4..=6 {
        assert!(marked(&ws, WIN, 10, y), "row {} not set", y);
    }
    assert!(!marked(&ws, WIN, 10, 3));
    assert!(!marked(&ws, WIN, 10, 7));
}

#[test]
fn close_supersedes_pending_busy_show() {
    let t0 = Instant::now();
    let mut ws = test_server();
    ws.create_window(DrawableId(3), Rect::new(0, 0, 20, 10), BitmapMode::Gray4, 0)
        .unwrap();
    ws.busy(Some(DrawableId(3)), Duration::from_millis(200), t0).unwrap();
    ws.close(DrawableId(3), t0 + Duration::from_millis(50)).unwrap();
    ws.run_timers(t0 + Duration::from_millis(300));

    assert!(!ws.timer_armed(TimerKind::BusyShow(DrawableId(3))));
    assert_eq!(ws.window_count(), 1);
    assert_eq!(ws.window(DrawableId(3)).err(), Some(OplError::DrawNotOpen));
}

#[test]
fn later_busy_replaces_earlier_one() {
    let t0 = Instant::now();
    let mut ws = test_server();
    for id in [3, 4] {
        ws.create_window(DrawableId(id), Rect::new(0, 0, 8, 8), BitmapMode::Gray2, 0)
            .unwrap();
    }
    ws.busy(Some(DrawableId(3)), Duration::from_millis(100), t0).unwrap();
    ws.busy(Some(DrawableId(4)), Duration::from_millis(100), t0).unwrap();
    ws.run_timers(t0 + Duration::from_millis(150));
    assert!(!ws.window(DrawableId(3)).unwrap().visible);
    assert!(ws.window(DrawableId(4)).unwrap().visible);
}

#[test]
fn flashing_cursor_restores_pixels_after_even_toggles() {
    let t0 = Instant::now();
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    ws.draw(&[DrawCommand::new(WIN, Point::new(3, 0), OpType::Line(Point::new(3, 19)))])
        .unwrap();
    let before = base_pixels(&ws, WIN);
    let flash = ws.config().cursor_flash;

    ws.cursor(
        Some(CursorSpec {
            window: WIN,
            rect: Rect::new(2, 2, 2, 8),
            flash: true,
            grey: false,
        }),
        t0,
    )
    .unwrap();
    assert_ne!(base_pixels(&ws, WIN), before);

    ws.run_timers(t0 + flash);
    assert_eq!(base_pixels(&ws, WIN), before);

    ws.run_timers(t0 + flash * 2);
    assert_ne!(base_pixels(&ws, WIN), before);

    ws.cursor(None, t0 + flash * 2).unwrap();
    assert_eq!(base_pixels(&ws, WIN), before);
    assert!(!ws.timer_armed(TimerKind::CursorFlash));
}

#[test]
fn copies_outside_either_drawable_change_nothing() {
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    ws.create_bitmap(DrawableId(5), Size::new(8, 8), BitmapMode::Gray2).unwrap();
    ws.draw(&[DrawCommand::new(DrawableId(5), Point::ZERO, OpType::Fill(Size::new(8, 8)))])
        .unwrap();
    let before = base_pixels(&ws, WIN);

    let source_outside = OpType::Copy {
        src: CopySource {
            drawable: DrawableId(5),
            rect: Rect::new(20, 20, 4, 4),
        },
        mask: None,
    };
    let dest_outside = OpType::Copy {
        src: CopySource {
            drawable: DrawableId(5),
            rect: Rect::new(0, 0, 8, 8),
        },
        mask: None,
    };
    let mcopy_outside = OpType::MCopy {
        src: DrawableId(5),
        rects: vec![Rect::new(0, 0, 4, 4)],
        points: vec![Point::new(-50, -50)],
    };
    ws.draw(&[
        DrawCommand::new(WIN, Point::ZERO, source_outside),
        DrawCommand::new(WIN, Point::new(100, 100), dest_outside),
        DrawCommand::new(WIN, Point::ZERO, mcopy_outside).with_mode(Mode::Invert),
    ])
    .unwrap();
    assert_eq!(base_pixels(&ws, WIN), before);
}

#[test]
fn copy_from_closed_bitmap_aborts_batch() {
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    let copy = OpType::Copy {
        src: CopySource {
            drawable: DrawableId(9),
            rect: Rect::new(0, 0, 4, 4),
        },
        mask: None,
    };
    let res = ws.draw(&[
        DrawCommand::new(WIN, Point::ZERO, OpType::Fill(Size::new(1, 1))),
        DrawCommand::new(WIN, Point::ZERO, copy),
        DrawCommand::new(WIN, Point::new(5, 5), OpType::Fill(Size::new(1, 1))),
    ]);
    assert_eq!(res, Err(OplError::DrawNotOpen));
    assert!(marked(&ws, WIN, 0, 0));
    assert!(!marked(&ws, WIN, 5, 5));
}

#[test]
fn printed_text_uses_provider_glyphs() {
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    let text = OpType::Text(TextOp {
        text: "AB".into(),
        font: FIXED_FONT,
        style: TextStyle::empty(),
        kind: TextKind::Print,
    });
    ws.draw(&[DrawCommand::new(WIN, Point::new(0, 10), text)]).unwrap();
    // glyph rows 1..7 sit below the line top at baseline - ascent
    assert!(!marked(&ws, WIN, 0, 3));
    assert!(marked(&ws, WIN, 0, 4));
    assert!(marked(&ws, WIN, 3, 9));
    assert!(!marked(&ws, WIN, 4, 4));
    assert!(marked(&ws, WIN, 5, 4));
}

#[test]
fn sprite_advances_on_shared_tick() {
    let t0 = Instant::now();
    let mut ws = server_with_window(Rect::new(0, 0, 20, 20), BitmapMode::Gray4);
    for id in [5, 6] {
        ws.create_bitmap(DrawableId(id), Size::new(4, 4), BitmapMode::Gray2).unwrap();
    }
    ws.draw(&[DrawCommand::new(DrawableId(5), Point::ZERO, OpType::Fill(Size::new(4, 4)))])
        .unwrap();
    let frame = |bitmap: i32| SpriteFrame {
        offset: Point::ZERO,
        bitmap: DrawableId(bitmap),
        mask: None,
        invert_mask: false,
        duration: Duration::from_millis(10),
    };
    let sprite = Sprite {
        origin: Point::new(2, 2),
        frames: vec![frame(5), frame(6)],
    };
    ws.set_sprite(WIN, 1, Some(sprite), t0).unwrap();
    assert!(ws.timer_armed(TimerKind::SpriteTick));

    let black_at_origin = |ws: &WindowServer| {
        ws.image(WIN)
            .unwrap()
            .pixel(2, 2)
            .is_some_and(|p| p & 0x00FF_FFFF == 0)
    };
    assert!(black_at_origin(&ws));

    // durations are floored to the minimum frame time
    let tick = ws.config().sprite_tick;
    ws.run_timers(t0 + tick);
    assert!(black_at_origin(&ws));
    ws.run_timers(t0 + tick * 2);
    assert!(!black_at_origin(&ws));

    ws.set_sprite(WIN, 1, None, t0 + tick * 2).unwrap();
    assert!(!ws.timer_armed(TimerKind::SpriteTick));
}

#[test]
fn peekline_reads_composited_window() {
    let mut ws = server_with_window(Rect::new(0, 0, 40, 20), BitmapMode::Gray4);
    ws.draw(&[DrawCommand::new(WIN, Point::ZERO, OpType::Fill(Size::new(3, 1)))])
        .unwrap();
    let res = ws.graphicsop(GraphicsOp::PeekLine {
        id: WIN,
        position: Point::ZERO,
        count: 4,
        mode: PeekMode::OneBit,
    });
    assert_eq!(res, GraphicsResult::Data(vec![0b0111, 0]));

    // columns past the right edge read as white
    let res = ws.graphicsop(GraphicsOp::GetImg {
        id: WIN,
        rect: Rect::new(38, 0, 4, 1),
        mode: PeekMode::OneBit,
    });
    assert_eq!(res, GraphicsResult::Data(vec![0, 0]));
}

#[test]
fn font_load_reports_metrics() {
    let mut ws = test_server();
    let GraphicsResult::FontMetrics(info) = ws.graphicsop(GraphicsOp::LoadFont {
        path: FIXED_FONT_PATH.into(),
    }) else {
        panic!("font did not load");
    };
    assert_eq!(info.font, FIXED_FONT);
    assert_eq!(info.metrics.height, 8);
    assert_eq!(
        ws.graphicsop(GraphicsOp::LoadFont {
            path: "missing.fon".into()
        }),
        GraphicsResult::Error(OplError::NotExists)
    );
}

#[test]
fn screen_image_stacks_windows_with_shadows() {
    let mut ws = test_server();
    ws.create_window(WIN, Rect::new(10, 5, 20, 10), BitmapMode::Gray4, 2)
        .unwrap();
    ws.set_visible(WIN, true).unwrap();
    let screen = ws.screen_image();
    assert_eq!(screen.pixel(10, 5), Some(Color::WHITE.argb()));
    assert_eq!(screen.pixel(31, 16), Some(Color::DARK_GREY.argb()));
    assert_eq!(screen.pixel(9, 5), Some(Color::WHITE.argb()));
}
