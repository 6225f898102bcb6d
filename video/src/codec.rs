//! Conversion between native bitmap samples and 32-bit ARGB pixels.
//!
//! Sub-byte samples are packed least significant bits first. Grey samples are
//! widened by bit replication so that the maximum sample maps to 0xFF.

use opal_abi::{Bitmap, BitmapMode, CodecError};

use crate::palette::{PALETTE16, PALETTE256, nearest_index};

const OPAQUE: u32 = 0xFF00_0000;

#[inline]
fn argb(rgb: u32) -> u32 {
    OPAQUE | (rgb & 0x00FF_FFFF)
}

#[inline]
fn gray(level: u8) -> u32 {
    let v = level as u32;
    argb((v << 16) | (v << 8) | v)
}

/// Widen an `bits`-wide sample to 8 bits by repeating its bit pattern
#[inline]
pub fn replicate(sample: u32, bits: u32) -> u8 {
    match bits {
        1 => {
            if sample & 1 != 0 {
                0xFF
            } else {
                0x00
            }
        }
        2 => {
            let v = sample & 0x3;
            (v | (v << 2) | (v << 4) | (v << 6)) as u8
        }
        4 => {
            let v = sample & 0xF;
            (v | (v << 4)) as u8
        }
        5 => {
            let v = sample & 0x1F;
            ((v << 3) | (v >> 2)) as u8
        }
        6 => {
            let v = sample & 0x3F;
            ((v << 2) | (v >> 4)) as u8
        }
        _ => sample as u8,
    }
}

/// Integer luminance, exact for grey input
#[inline]
pub fn luma(pixel: u32) -> u8 {
    let r = (pixel >> 16) & 0xFF;
    let g = (pixel >> 8) & 0xFF;
    let b = pixel & 0xFF;
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}

#[inline]
fn read_sample(row: &[u8], x: usize, bits: u32) -> u32 {
    match bits {
        1 | 2 | 4 => {
            let per_byte = 8 / bits as usize;
            let byte = row[x / per_byte] as u32;
            let shift = (x % per_byte) as u32 * bits;
            (byte >> shift) & ((1 << bits) - 1)
        }
        8 => row[x] as u32,
        16 => u16::from_le_bytes([row[x * 2], row[x * 2 + 1]]) as u32,
        _ => {
            let i = x * 3;
            // stored B, G, R
            (row[i + 2] as u32) << 16 | (row[i + 1] as u32) << 8 | row[i] as u32
        }
    }
}

#[inline]
fn write_sample(row: &mut [u8], x: usize, bits: u32, sample: u32) {
    match bits {
        1 | 2 | 4 => {
            let per_byte = 8 / bits as usize;
            let shift = (x % per_byte) as u32 * bits;
            let mask = (((1u32 << bits) - 1) << shift) as u8;
            let byte = &mut row[x / per_byte];
            *byte = (*byte & !mask) | (((sample << shift) as u8) & mask);
        }
        8 => row[x] = sample as u8,
        16 => row[x * 2..x * 2 + 2].copy_from_slice(&(sample as u16).to_le_bytes()),
        _ => {
            let i = x * 3;
            row[i] = sample as u8;
            row[i + 1] = (sample >> 8) as u8;
            row[i + 2] = (sample >> 16) as u8;
        }
    }
}

fn decode_sample(mode: BitmapMode, sample: u32) -> u32 {
    match mode {
        BitmapMode::Gray2 => gray(replicate(sample, 1)),
        BitmapMode::Gray4 => gray(replicate(sample, 2)),
        BitmapMode::Gray16 => gray(replicate(sample, 4)),
        BitmapMode::Gray256 => gray(sample as u8),
        BitmapMode::Color16 => argb(PALETTE16[(sample & 0xF) as usize]),
        BitmapMode::Color256 => argb(PALETTE256[(sample & 0xFF) as usize]),
        BitmapMode::Color4K => {
            let r = replicate(sample >> 8, 4) as u32;
            let g = replicate(sample >> 4, 4) as u32;
            let b = replicate(sample, 4) as u32;
            argb((r << 16) | (g << 8) | b)
        }
        BitmapMode::Color64K => {
            let r = replicate(sample >> 11, 5) as u32;
            let g = replicate(sample >> 5, 6) as u32;
            let b = replicate(sample, 5) as u32;
            argb((r << 16) | (g << 8) | b)
        }
        BitmapMode::Color16M => argb(sample),
    }
}

fn encode_pixel(mode: BitmapMode, pixel: u32) -> u32 {
    let r = (pixel >> 16) & 0xFF;
    let g = (pixel >> 8) & 0xFF;
    let b = pixel & 0xFF;
    match mode {
        BitmapMode::Gray2 => (luma(pixel) >> 7) as u32,
        BitmapMode::Gray4 => (luma(pixel) >> 6) as u32,
        BitmapMode::Gray16 => (luma(pixel) >> 4) as u32,
        BitmapMode::Gray256 => luma(pixel) as u32,
        BitmapMode::Color16 => nearest_index(&PALETTE16, pixel) as u32,
        BitmapMode::Color256 => nearest_index(&PALETTE256, pixel) as u32,
        BitmapMode::Color4K => ((r >> 4) << 8) | ((g >> 4) << 4) | (b >> 4),
        BitmapMode::Color64K => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
        BitmapMode::Color16M => pixel & 0x00FF_FFFF,
    }
}

/// Expand a native bitmap to one opaque ARGB word per pixel, row major.
pub fn decode(bitmap: &Bitmap) -> Result<Vec<u32>, CodecError> {
    if !bitmap.is_well_formed() {
        return Err(CodecError::InvalidBitmap);
    }
    let bits = bitmap.mode.storage_bits();
    let width = bitmap.width as usize;
    let mut out = Vec::with_capacity(width * bitmap.height as usize);
    for y in 0..bitmap.height {
        let row = bitmap.row(y).ok_or(CodecError::InvalidBitmap)?;
        for x in 0..width {
            out.push(decode_sample(bitmap.mode, read_sample(row, x, bits)));
        }
    }
    Ok(out)
}

/// Pack ARGB pixels into a native bitmap with a word-aligned stride.
pub fn encode(pixels: &[u32], width: i32, height: i32, mode: BitmapMode) -> Result<Bitmap, CodecError> {
    if width <= 0 || height <= 0 || pixels.len() != width as usize * height as usize {
        return Err(CodecError::InvalidBitmap);
    }
    let bits = mode.storage_bits();
    let stride = mode.aligned_stride(width);
    let mut data = vec![0u8; stride * height as usize];
    for (row_pixels, row) in pixels.chunks(width as usize).zip(data.chunks_mut(stride)) {
        for (x, &pixel) in row_pixels.iter().enumerate() {
            write_sample(row, x, bits, encode_pixel(mode, pixel));
        }
    }
    Ok(Bitmap {
        width,
        height,
        stride,
        mode,
        data,
    })
}
