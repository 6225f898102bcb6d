//! Draw command types
//!
//! A `DrawCommand` is one graphics primitive aimed at one drawable. The
//! interpreter batches them; the window server applies a batch in order.

use crate::bitmap::MaskedBitmap;
use crate::geometry::{Point, Rect, Size};
use crate::video_traits::FontDescriptor;

/// Handle naming a window or off-screen bitmap
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub i32);

impl DrawableId {
    /// The always-present top-level window
    pub const ROOT: DrawableId = DrawableId(1);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl core::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGB colour, 0x00RRGGBB
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const DARK_GREY: Color = Color(0x555555);
    pub const LIGHT_GREY: Color = Color(0xAAAAAA);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[inline]
    pub const fn gray(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    /// Opaque 0xAARRGGBB pixel value
    #[inline]
    pub const fn argb(self) -> u32 {
        0xFF00_0000 | (self.0 & 0x00FF_FFFF)
    }
}

/// How new ink combines with existing pixels
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Draw only ink pixels; background is transparent
    #[default]
    Set = 0,
    /// Paint background wherever the source has ink
    Clear = 1,
    /// XOR destination wherever the source has ink
    Invert = 2,
    /// Unconditional overwrite
    Replace = 3,
}

impl Mode {
    pub fn from_raw(val: i32) -> Option<Self> {
        match val {
            0 => Some(Self::Set),
            1 => Some(Self::Clear),
            2 => Some(Self::Invert),
            3 => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Which plane of a 4-level grey window a command targets
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GreyMode {
    #[default]
    Normal = 0,
    GreyOnly = 1,
    Both = 2,
}

impl GreyMode {
    #[inline]
    pub fn draws_base(self) -> bool {
        matches!(self, Self::Normal | Self::Both)
    }

    #[inline]
    pub fn draws_grey(self) -> bool {
        matches!(self, Self::GreyOnly | Self::Both)
    }
}

/// A source region inside another drawable
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CopySource {
    pub drawable: DrawableId,
    pub rect: Rect,
}

/// Tile source for `OpType::Pattern`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PatternSource {
    /// Built-in 50% dither
    Dither,
    Drawable(DrawableId),
}

impl PatternSource {
    /// Legacy encoding: -1 selects the built-in dither
    pub fn from_raw(id: i32) -> Self {
        if id == -1 {
            Self::Dither
        } else {
            Self::Drawable(DrawableId(id))
        }
    }
}

/// Alignment of text inside an extended print box
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
}

/// Frame drawn around an extended print box
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExtendedBorder {
    #[default]
    None,
    /// One pixel outline
    Plain,
    /// Inverse box
    Inverse,
    /// Inverse box with the four corner pixels left untouched
    InverseRounded,
}

bitflags::bitflags! {
    /// Text rendering style bits, legacy bit positions
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct TextStyle: u32 {
        const BOLD = 1 << 0;
        const UNDERLINE = 1 << 1;
        const INVERSE = 1 << 2;
        const DOUBLE_HEIGHT = 1 << 3;
        const MONO = 1 << 4;
        const ITALIC = 1 << 5;
    }
}

/// Plain print versus boxed ("extended") print
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextKind {
    Print,
    Extended {
        width: i32,
        align: TextAlign,
        border: ExtendedBorder,
        /// Gap between the box edge and the text
        margin: i32,
    },
}

/// A text draw: `origin` is the left end of the baseline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOp {
    pub text: String,
    pub font: FontDescriptor,
    pub style: TextStyle,
    pub kind: TextKind,
}

/// Named frame styles for `OpType::Border`
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BorderKind {
    SinglePixel = 0,
    Shadowed = 1,
    DoublePixel = 2,
    Sunken = 3,
    Raised = 4,
    Bar = 5,
}

impl BorderKind {
    pub fn from_raw(val: i32) -> Option<Self> {
        match val {
            0 => Some(Self::SinglePixel),
            1 => Some(Self::Shadowed),
            2 => Some(Self::DoublePixel),
            3 => Some(Self::Sunken),
            4 => Some(Self::Raised),
            5 => Some(Self::Bar),
            _ => None,
        }
    }
}

/// The primitive a command performs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpType {
    Fill(Size),
    Circle { radius: i32, fill: bool },
    Ellipse { h_radius: i32, v_radius: i32, fill: bool },
    /// Line from the command origin to this point
    Line(Point),
    Box(Size),
    BitBlt(MaskedBitmap),
    Copy { src: CopySource, mask: Option<CopySource> },
    /// Several copies from one source: `rects[i]` lands at `points[i]`
    MCopy { src: DrawableId, rects: Vec<Rect>, points: Vec<Point> },
    Pattern { src: PatternSource, size: Size },
    Scroll { dx: i32, dy: i32, rect: Rect },
    Text(TextOp),
    Border { rect: Rect, kind: BorderKind },
    /// XOR a rectangle, leaving its corner pixels alone
    Invert(Size),
}

/// One graphics primitive aimed at one drawable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    pub drawable: DrawableId,
    pub op: OpType,
    pub origin: Point,
    pub color: Color,
    pub bg_color: Color,
    pub mode: Mode,
    pub pen_width: i32,
    pub grey_mode: GreyMode,
}

impl DrawCommand {
    /// Black ink on white, set mode, single pixel pen
    pub fn new(drawable: DrawableId, origin: Point, op: OpType) -> Self {
        Self {
            drawable,
            op,
            origin,
            color: Color::BLACK,
            bg_color: Color::WHITE,
            mode: Mode::Set,
            pen_width: 1,
            grey_mode: GreyMode::Normal,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_colors(mut self, color: Color, bg_color: Color) -> Self {
        self.color = color;
        self.bg_color = bg_color;
        self
    }

    pub fn with_pen_width(mut self, pen_width: i32) -> Self {
        self.pen_width = pen_width;
        self
    }

    pub fn with_grey_mode(mut self, grey_mode: GreyMode) -> Self {
        self.grey_mode = grey_mode;
        self
    }

    /// Drawables other than the target that the command reads from
    pub fn sources(&self) -> Vec<DrawableId> {
        match &self.op {
            OpType::Copy { src, mask } => {
                let mut ids = vec![src.drawable];
                if let Some(mask) = mask {
                    ids.push(mask.drawable);
                }
                ids
            }
            OpType::MCopy { src, .. } => vec![*src],
            OpType::Pattern {
                src: PatternSource::Drawable(id),
                ..
            } => vec![*id],
            _ => Vec::new(),
        }
    }
}
