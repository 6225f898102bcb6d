//! Native bitmap descriptions
//!
//! A `Bitmap` is raw sample data in one of the platform's display modes.
//! Conversion to the 32-bit in-memory form lives in the video crate's codec;
//! this module only describes layout.

use crate::geometry::Size;

/// Colour depth and interpretation of bitmap samples.
///
/// Indexed modes use fixed palettes that are not stored per bitmap.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitmapMode {
    /// 1 bit per pixel, black and white
    Gray2 = 0,
    /// 2 bits per pixel, four grey levels
    #[default]
    Gray4 = 1,
    /// 4 bits per pixel grey
    Gray16 = 2,
    /// 8 bits per pixel grey
    Gray256 = 3,
    /// 4 bits per pixel, 16 entry palette
    Color16 = 4,
    /// 8 bits per pixel, 256 entry palette
    Color256 = 5,
    /// 16 bits per pixel, RGB565
    Color64K = 6,
    /// 24 bits per pixel, stored B, G, R
    Color16M = 7,
    /// 12 bits per pixel stored in 16-bit words as 0x0RGB
    Color4K = 9,
}

impl BitmapMode {
    /// Convert from the legacy mode number
    pub fn from_raw(val: i32) -> Option<Self> {
        match val {
            0 => Some(Self::Gray2),
            1 => Some(Self::Gray4),
            2 => Some(Self::Gray16),
            3 => Some(Self::Gray256),
            4 => Some(Self::Color16),
            5 => Some(Self::Color256),
            6 => Some(Self::Color64K),
            7 => Some(Self::Color16M),
            9 => Some(Self::Color4K),
            _ => None,
        }
    }

    /// Significant bits per pixel
    #[inline]
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Gray2 => 1,
            Self::Gray4 => 2,
            Self::Gray16 | Self::Color16 => 4,
            Self::Gray256 | Self::Color256 => 8,
            Self::Color4K => 12,
            Self::Color64K => 16,
            Self::Color16M => 24,
        }
    }

    /// Bits each pixel occupies in storage (12-bit colour is word aligned)
    #[inline]
    pub fn storage_bits(self) -> u32 {
        match self {
            Self::Color4K => 16,
            other => other.bits_per_pixel(),
        }
    }

    /// Minimum bytes needed to hold one row of `width` pixels
    #[inline]
    pub fn min_stride(self, width: i32) -> usize {
        let bits = width.max(0) as usize * self.storage_bits() as usize;
        bits.div_ceil(8)
    }

    /// Row stride rounded up to a 32-bit word, as the platform lays out bitmaps
    #[inline]
    pub fn aligned_stride(self, width: i32) -> usize {
        self.min_stride(width).div_ceil(4) * 4
    }
}

/// Raw bitmap samples in a native display mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: i32,
    pub height: i32,
    /// Bytes per row, at least `mode.min_stride(width)`
    pub stride: usize,
    pub mode: BitmapMode,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Check the layout invariants without touching the samples
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.stride >= self.mode.min_stride(self.width)
            && self.data.len() >= self.stride * self.height as usize
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Row slice for `y`, or `None` past the end of the data
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.stride)
    }
}

/// A bitmap plus an optional equal-sized mask.
///
/// Mask samples use the platform convention: 0 (black) is opaque ink, so a
/// mask is the inverse of a conventional alpha channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedBitmap {
    pub bitmap: Bitmap,
    pub mask: Option<Bitmap>,
}

impl MaskedBitmap {
    pub fn new(bitmap: Bitmap) -> Self {
        Self { bitmap, mask: None }
    }

    pub fn with_mask(bitmap: Bitmap, mask: Bitmap) -> Self {
        Self {
            bitmap,
            mask: Some(mask),
        }
    }

    /// Masks must match the bitmap's dimensions
    pub fn is_well_formed(&self) -> bool {
        self.bitmap.is_well_formed()
            && self
                .mask
                .as_ref()
                .is_none_or(|m| m.is_well_formed() && m.size() == self.bitmap.size())
    }
}
