//! Input delivery from the presentation layer to GETEVENT and KEYA.

use std::time::Duration;

use opal_abi::{
    AsyncRequest, BitmapMode, DrawCommand, DrawableId, Event, GraphicsOp, GraphicsResult, Modifiers, OpType, OplError,
    PeekMode, PenInfo, Point, Rect, Response, ResponseValue, Size, keycode,
};
use opal_drivers::PenAction;
use opal_lib::{KeyEventMode, RuntimeConfig};

use crate::fixtures::{MemoryFs, TestRuntime, test_config, test_runtime};

fn runtime(key_events: KeyEventMode) -> TestRuntime {
    let config = RuntimeConfig {
        key_events,
        ..test_config()
    };
    test_runtime(config, MemoryFs::default())
}

fn event_of(res: Response) -> Event {
    match res.value {
        ResponseValue::Event(event) => event,
        other => panic!("request {} completed with {:?}", res.handle, other),
    }
}

#[test]
fn getevent_sees_down_press_up_in_order() {
    let t = runtime(KeyEventMode::DownUp);
    let rt = &t.runtime;
    rt.events().key_down('k' as u32, Modifiers::SHIFT);
    rt.events().key_up('k' as u32, Modifiers::SHIFT);
    assert!(rt.test_event());

    let mut seen = Vec::new();
    for handle in 1..=3 {
        rt.async_request(handle, AsyncRequest::GetEvent).unwrap();
        seen.push(event_of(rt.wait_for_any_request()));
    }
    assert!(matches!(seen[0], Event::KeyDown(k) if k.keycode == 'k' as u32));
    assert!(matches!(seen[1], Event::KeyPress { key, repeat: false } if key.modifiers == Modifiers::SHIFT));
    assert!(matches!(seen[2], Event::KeyUp(_)));
    assert!(!rt.test_event());
}

#[test]
fn keywait_skips_to_next_character() {
    let t = runtime(KeyEventMode::DownUp);
    let rt = &t.runtime;
    rt.events().pen(
        PenAction::Down,
        PenInfo {
            window: DrawableId::ROOT,
            x: 4,
            y: 4,
            screen_x: 4,
            screen_y: 4,
            modifiers: Modifiers::empty(),
            timestamp: 0,
        },
    );
    rt.events().key_down(keycode::UP, Modifiers::empty());
    rt.events().key_down('a' as u32, Modifiers::CTRL);

    rt.async_request(10, AsyncRequest::KeyWait).unwrap();
    let res = rt.wait_for_any_request();
    assert_eq!(res.handle, 10);
    assert_eq!(event_of(res).char_code(), Some(1));
    assert_eq!(rt.keys_down(), vec!['a' as u32, keycode::UP]);
}

#[test]
fn event_posted_later_completes_the_wait() {
    let t = runtime(KeyEventMode::PressOnly);
    let rt = &t.runtime;
    rt.async_request(4, AsyncRequest::GetEvent).unwrap();
    assert!(rt.scheduler().wait_for_any_request_timeout(Duration::from_millis(20)).is_none());
    rt.events().post(Event::Foreground { timestamp: 12 });
    assert_eq!(event_of(rt.wait_for_any_request()), Event::Foreground { timestamp: 12 });
}

#[test]
fn draws_and_graphics_ops_share_one_order() {
    let t = runtime(KeyEventMode::DownUp);
    let rt = &t.runtime;
    let res = rt.graphicsop(GraphicsOp::CreateWindow {
        id: DrawableId(2),
        frame: Rect::new(0, 0, 16, 8),
        mode: BitmapMode::Gray4,
        shadow: 0,
    });
    assert_eq!(res, GraphicsResult::Nothing);
    rt.draw(vec![DrawCommand::new(
        DrawableId(2),
        Point::ZERO,
        OpType::Fill(Size::new(2, 1)),
    )])
    .unwrap();
    assert_eq!(
        rt.graphicsop(GraphicsOp::PeekLine {
            id: DrawableId(2),
            position: Point::ZERO,
            count: 3,
            mode: PeekMode::OneBit,
        }),
        GraphicsResult::Data(vec![0b011, 0])
    );
    assert_eq!(rt.graphicsop(GraphicsOp::Rank(DrawableId(2))), GraphicsResult::Rank(1));
    assert_eq!(
        rt.graphicsop(GraphicsOp::Close(DrawableId::ROOT)),
        GraphicsResult::Error(OplError::InvalidArgs)
    );
}
