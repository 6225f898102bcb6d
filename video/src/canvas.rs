//! Pixel surfaces.
//!
//! A `Canvas` keeps one ARGB word per pixel so reads, writes and XORs are
//! O(1) regardless of the bitmap mode it was created with. The mode only
//! matters when pixels cross the codec boundary.

use core::cell::OnceCell;
use std::sync::Arc;

use opal_abi::{Bitmap, BitmapMode, CodecError, Color, Point, Rect, Size};

use crate::codec;

pub const WHITE: u32 = 0xFFFF_FFFF;
pub const BLACK_PIXEL: u32 = 0xFF00_0000;

/// RGB bits that an XOR draw flips
const INVERT_MASK: u32 = 0x00FF_FFFF;

/// Immutable snapshot of a surface.
///
/// Alpha matters here: composited images and masks may carry transparent
/// pixels, canvases never do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub size: Size,
    pub pixels: Vec<u32>,
}

impl Image {
    pub fn new(size: Size, fill: u32) -> Self {
        Self {
            size,
            pixels: vec![fill; size.area()],
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(Point::ZERO, self.size)
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(self.pixels[y as usize * self.size.width as usize + x as usize])
    }

    /// Alpha from darkness: black becomes opaque, white transparent
    pub fn inverted_mask(&self) -> Image {
        self.map_alpha(|luma| 255 - luma)
    }

    /// Alpha from brightness
    pub fn direct_mask(&self) -> Image {
        self.map_alpha(|luma| luma)
    }

    fn map_alpha(&self, f: impl Fn(u32) -> u32) -> Image {
        Image {
            size: self.size,
            pixels: self
                .pixels
                .iter()
                .map(|&p| (f(codec::luma(p) as u32) << 24) | (p & 0x00FF_FFFF))
                .collect(),
        }
    }
}

#[inline]
pub fn is_opaque(pixel: u32) -> bool {
    pixel >> 24 >= 0x80
}

/// Non-white opaque pixel
#[inline]
pub fn is_ink(pixel: u32) -> bool {
    is_opaque(pixel) && pixel & 0x00FF_FFFF != 0x00FF_FFFF
}

/// Off-screen pixel surface, created white
#[derive(Debug)]
pub struct Canvas {
    size: Size,
    mode: BitmapMode,
    pixels: Vec<u32>,
    image: OnceCell<Arc<Image>>,
}

impl Clone for Canvas {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            mode: self.mode,
            pixels: self.pixels.clone(),
            image: OnceCell::new(),
        }
    }
}

impl Canvas {
    pub fn new(size: Size, mode: BitmapMode) -> Self {
        let size = Size::new(size.width.max(0), size.height.max(0));
        Self {
            size,
            mode,
            pixels: vec![WHITE; size.area()],
            image: OnceCell::new(),
        }
    }

    pub fn from_bitmap(bitmap: &Bitmap) -> Result<Self, CodecError> {
        let pixels = codec::decode(bitmap)?;
        Ok(Self {
            size: bitmap.size(),
            mode: bitmap.mode,
            pixels,
            image: OnceCell::new(),
        })
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn mode(&self) -> BitmapMode {
        self.mode
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(Point::ZERO, self.size)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            None
        } else {
            Some(y as usize * self.size.width as usize + x as usize)
        }
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Out-of-bounds writes are dropped
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, argb: u32) {
        if let Some(i) = self.index(x, y) {
            self.image.take();
            self.pixels[i] = 0xFF00_0000 | argb;
        }
    }

    #[inline]
    pub fn xor_pixel(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.image.take();
            self.pixels[i] ^= INVERT_MASK;
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(clip) = rect.intersection(&self.bounds()) else {
            return;
        };
        self.image.take();
        let argb = color.argb();
        let width = self.size.width as usize;
        for y in clip.y()..clip.max_y() {
            let row = y as usize * width;
            self.pixels[row + clip.x() as usize..row + clip.max_x() as usize].fill(argb);
        }
    }

    /// Cached snapshot, rebuilt after any mutation
    pub fn image(&self) -> Arc<Image> {
        self.image
            .get_or_init(|| {
                Arc::new(Image {
                    size: self.size,
                    pixels: self.pixels.clone(),
                })
            })
            .clone()
    }

    pub fn inverted_mask(&self) -> Image {
        self.image().inverted_mask()
    }

    pub fn raw_pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// True when any pixel differs from white
    pub fn is_marked(&self, x: i32, y: i32) -> bool {
        self.pixel(x, y).is_some_and(|p| p & 0x00FF_FFFF != 0x00FF_FFFF)
    }

    /// Copy `image` opaquely with its top-left at `at`
    pub fn paste(&mut self, image: &Image, at: Point) {
        for y in 0..image.size.height {
            for x in 0..image.size.width {
                if let Some(px) = image.pixel(x, y) {
                    if is_opaque(px) {
                        self.set_pixel(at.x + x, at.y + y, px);
                    }
                }
            }
        }
    }

    pub fn to_bitmap(&self) -> Result<Bitmap, CodecError> {
        codec::encode(&self.pixels, self.size.width, self.size.height, self.mode)
    }
}
