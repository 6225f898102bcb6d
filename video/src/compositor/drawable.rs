//! Drawables owned by the window server.
//!
//! Windows and bitmaps are plain structs held in the server's map. Sprite
//! frames refer to other drawables by id only, so closing a bitmap never
//! leaves a dangling reference behind.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use opal_abi::{BitmapMode, ClockInfo, Point, Rect, Size, Sprite, SpriteFrame};

use crate::canvas::{Canvas, Image};

/// A sprite plus its animation position
#[derive(Clone, Debug)]
pub struct SpriteState {
    pub sprite: Sprite,
    /// Time spent on the current frame
    pub elapsed: Duration,
    pub current: usize,
}

impl SpriteState {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            sprite,
            elapsed: Duration::ZERO,
            current: 0,
        }
    }

    #[inline]
    pub fn frame(&self) -> Option<&SpriteFrame> {
        self.sprite.frames.get(self.current)
    }

    /// Advance the animation by `dt`. Returns true when the frame changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let count = self.sprite.frames.len();
        if count < 2 {
            return false;
        }
        self.elapsed += dt;
        let mut changed = false;
        loop {
            let duration = self.sprite.frames[self.current].duration;
            if duration.is_zero() || self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;
            self.current = (self.current + 1) % count;
            changed = true;
        }
        changed
    }
}

/// An on-screen drawable
#[derive(Debug)]
pub struct Window {
    pub canvas: Canvas,
    /// Second plane of a 4-level grey window
    pub grey: Option<Canvas>,
    pub visible: bool,
    pub frame: Rect,
    pub shadow: i32,
    pub clock: Option<ClockInfo>,
    pub sprites: BTreeMap<i32, SpriteState>,
}

impl Window {
    pub fn new(frame: Rect, mode: BitmapMode, shadow: i32) -> Self {
        let grey = (mode == BitmapMode::Gray4).then(|| Canvas::new(frame.size, BitmapMode::Gray2));
        Self {
            canvas: Canvas::new(frame.size, mode),
            grey,
            visible: false,
            frame,
            shadow: shadow.max(0),
            clock: None,
            sprites: BTreeMap::new(),
        }
    }

    /// Replace the backing planes, keeping old content at the top-left
    pub fn resize(&mut self, size: Size) {
        let mut canvas = Canvas::new(size, self.canvas.mode());
        canvas.paste(&self.canvas.image(), Point::ZERO);
        self.canvas = canvas;
        if let Some(old) = self.grey.take() {
            let mut grey = Canvas::new(size, old.mode());
            grey.paste(&old.image(), Point::ZERO);
            self.grey = Some(grey);
        }
        self.frame.size = size;
    }

    /// True when the composite differs from the base canvas
    #[inline]
    pub fn has_overlays(&self) -> bool {
        self.grey.is_some() || !self.sprites.is_empty() || self.clock.is_some()
    }
}

#[derive(Debug)]
pub enum Drawable {
    Bitmap(Canvas),
    Window(Window),
}

impl Drawable {
    /// The plane normal drawing targets
    pub fn base(&self) -> &Canvas {
        match self {
            Self::Bitmap(canvas) => canvas,
            Self::Window(win) => &win.canvas,
        }
    }

    pub fn base_mut(&mut self) -> &mut Canvas {
        match self {
            Self::Bitmap(canvas) => canvas,
            Self::Window(win) => &mut win.canvas,
        }
    }

    pub fn grey_mut(&mut self) -> Option<&mut Canvas> {
        match self {
            Self::Bitmap(_) => None,
            Self::Window(win) => win.grey.as_mut(),
        }
    }

    pub fn as_window(&self) -> Option<&Window> {
        match self {
            Self::Window(win) => Some(win),
            Self::Bitmap(_) => None,
        }
    }

    pub fn as_window_mut(&mut self) -> Option<&mut Window> {
        match self {
            Self::Window(win) => Some(win),
            Self::Bitmap(_) => None,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.base().size()
    }

    /// Base-plane snapshot; overlays are composited by the server
    #[inline]
    pub fn image(&self) -> Arc<Image> {
        self.base().image()
    }

    pub fn inverted_mask(&self) -> Image {
        self.base().inverted_mask()
    }

    pub fn raw_pixels(&self) -> &[u32] {
        self.base().raw_pixels()
    }
}
