//! Window server operations and their results
//!
//! Everything the interpreter can ask of the window server outside of a draw
//! batch is a `GraphicsOp`. Each call yields exactly one `GraphicsResult`.

use core::time::Duration;

use crate::bitmap::BitmapMode;
use crate::draw::DrawableId;
use crate::error::OplError;
use crate::geometry::{Point, Rect, Size};
use crate::video_traits::{FontDescriptor, FontInfo};

/// One frame of a sprite animation.
///
/// `bitmap` and `mask` name drawables by id. They are looked up at composite
/// time, so a frame whose bitmap has since been closed is simply skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteFrame {
    pub offset: Point,
    pub bitmap: DrawableId,
    pub mask: Option<DrawableId>,
    /// Use the mask as-is instead of inverting it
    pub invert_mask: bool,
    pub duration: Duration,
}

/// A timed sequence of masked frames overlaid on a window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    /// Window-local position of frame offsets
    pub origin: Point,
    pub frames: Vec<SpriteFrame>,
}

/// Clock face style
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ClockFace {
    #[default]
    Digital,
    Analog,
}

/// Clock overlay attached to a window
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockInfo {
    pub face: ClockFace,
    /// Window-local top-left of the face
    pub position: Point,
    /// Font for the digital face
    pub font: FontDescriptor,
}

/// Text cursor description
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CursorSpec {
    pub window: DrawableId,
    /// Window-local cursor rectangle
    pub rect: Rect,
    pub flash: bool,
    /// Draw on the grey plane as well as the base plane
    pub grey: bool,
}

/// Bit depth requested by `peekline`/`getimg`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PeekMode {
    /// 1 bit per pixel, bit set = black
    #[default]
    OneBit,
    /// 2 bits per pixel grey, 0 = white, 3 = black
    TwoBit,
    /// 4 bits per pixel grey, 0 = white, 15 = black
    FourBit,
}

impl PeekMode {
    pub fn from_raw(val: i32) -> Option<Self> {
        match val {
            -1 | 0 => Some(Self::OneBit),
            1 => Some(Self::TwoBit),
            2 => Some(Self::FourBit),
            _ => None,
        }
    }

    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            Self::OneBit => 1,
            Self::TwoBit => 2,
            Self::FourBit => 4,
        }
    }
}

/// Non-draw requests to the window server
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphicsOp {
    Close(DrawableId),
    CreateBitmap {
        id: DrawableId,
        size: Size,
        mode: BitmapMode,
    },
    CreateWindow {
        id: DrawableId,
        frame: Rect,
        mode: BitmapMode,
        shadow: i32,
    },
    LoadFont {
        path: String,
    },
    /// Move a window to `rank` (1 = front)
    Order {
        id: DrawableId,
        rank: i32,
    },
    Rank(DrawableId),
    Show {
        id: DrawableId,
        visible: bool,
    },
    /// Show `id` after `delay`; `None` cancels a pending show
    Busy {
        id: Option<DrawableId>,
        delay: Duration,
    },
    /// Show `id` as the transient info window; `None` hides it
    InfoPrint(Option<DrawableId>),
    SetWin {
        id: DrawableId,
        position: Point,
        size: Option<Size>,
    },
    Sprite {
        window: DrawableId,
        sprite_id: i32,
        sprite: Option<Sprite>,
    },
    Clock {
        window: DrawableId,
        info: Option<ClockInfo>,
    },
    PeekLine {
        id: DrawableId,
        position: Point,
        count: i32,
        mode: PeekMode,
    },
    GetImg {
        id: DrawableId,
        rect: Rect,
        mode: PeekMode,
    },
    Cursor(Option<CursorSpec>),
}

impl GraphicsOp {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Close(_) => "close",
            Self::CreateBitmap { .. } => "createBitmap",
            Self::CreateWindow { .. } => "createWindow",
            Self::LoadFont { .. } => "loadFont",
            Self::Order { .. } => "order",
            Self::Rank(_) => "rank",
            Self::Show { .. } => "show",
            Self::Busy { .. } => "busy",
            Self::InfoPrint(_) => "giprint",
            Self::SetWin { .. } => "setwin",
            Self::Sprite { .. } => "sprite",
            Self::Clock { .. } => "clock",
            Self::PeekLine { .. } => "peekline",
            Self::GetImg { .. } => "getimg",
            Self::Cursor(_) => "cursor",
        }
    }
}

/// Outcome of a `GraphicsOp`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphicsResult {
    Nothing,
    Data(Vec<u8>),
    Rank(i32),
    Error(OplError),
    FontMetrics(FontInfo),
}

impl GraphicsResult {
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error(&self) -> Option<OplError> {
        match self {
            Self::Error(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<Result<GraphicsResult, OplError>> for GraphicsResult {
    fn from(res: Result<GraphicsResult, OplError>) -> Self {
        res.unwrap_or_else(GraphicsResult::Error)
    }
}
