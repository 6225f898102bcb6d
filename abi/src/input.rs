//! Input event types delivered to GETEVENT and KEYA waits

use crate::draw::DrawableId;

bitflags::bitflags! {
    /// Modifier keys, legacy bit positions
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 1;
        const CTRL = 1 << 2;
        const PSION = 1 << 3;
        const CAPS = 1 << 4;
        const FN = 1 << 5;
    }
}

/// Keycodes for keys that have no character
pub mod keycode {
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const UP: u32 = 256;
    pub const DOWN: u32 = 257;
    pub const RIGHT: u32 = 258;
    pub const LEFT: u32 = 259;
    pub const PAGE_UP: u32 = 260;
    pub const PAGE_DOWN: u32 = 261;
    pub const HOME: u32 = 262;
    pub const END: u32 = 263;
    pub const MENU: u32 = 290;
    pub const HELP: u32 = 291;
    pub const DIAMOND: u32 = 292;

    /// Codes below this are characters
    pub const FIRST_SPECIAL: u32 = 256;
}

/// Key event payload
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyInfo {
    pub keycode: u32,
    pub modifiers: Modifiers,
    /// Milliseconds since the runtime started
    pub timestamp: u64,
}

/// Pen (pointer) event payload
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PenInfo {
    pub window: DrawableId,
    /// Window-local coordinates
    pub x: i32,
    pub y: i32,
    pub screen_x: i32,
    pub screen_y: i32,
    pub modifiers: Modifiers,
    pub timestamp: u64,
}

/// Everything the presentation layer can report
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    KeyDown(KeyInfo),
    KeyUp(KeyInfo),
    KeyPress { key: KeyInfo, repeat: bool },
    PenDown(PenInfo),
    PenUp(PenInfo),
    PenDrag(PenInfo),
    Foreground { timestamp: u64 },
    Background { timestamp: u64 },
    Quit,
    Cancelled,
    Interrupt,
}

impl Event {
    /// Character code carried by a key press, if any
    pub fn char_code(&self) -> Option<u32> {
        match self {
            Event::KeyPress { key, .. }
                if key.keycode > 0 && key.keycode < keycode::FIRST_SPECIAL =>
            {
                Some(key.keycode)
            }
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Event::KeyDown(k) | Event::KeyUp(k) => Some(k.timestamp),
            Event::KeyPress { key, .. } => Some(key.timestamp),
            Event::PenDown(p) | Event::PenUp(p) | Event::PenDrag(p) => Some(p.timestamp),
            Event::Foreground { timestamp } | Event::Background { timestamp } => {
                Some(*timestamp)
            }
            Event::Quit | Event::Cancelled | Event::Interrupt => None,
        }
    }
}
