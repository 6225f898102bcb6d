//! Pixel read-back for `peekline` and `getimg`.
//!
//! Samples are darkness levels: 0 is white and the largest value black, so a
//! set bit in 1-bit mode is a black pixel. Pixels outside the image read as
//! white. Each row is packed least significant bits first and padded to a
//! 16-bit word.

use opal_abi::{PeekMode, Rect};

use crate::canvas::Image;
use crate::codec;

#[inline]
pub fn quantize(pixel: u32, mode: PeekMode) -> u8 {
    let luma = codec::luma(pixel);
    match mode {
        PeekMode::OneBit => u8::from(luma < 0x80),
        PeekMode::TwoBit => 3 - (luma >> 6),
        PeekMode::FourBit => 15 - (luma >> 4),
    }
}

/// Bytes in one packed row of `count` samples
#[inline]
pub fn row_bytes(count: usize, mode: PeekMode) -> usize {
    (count * mode.bits() as usize).div_ceil(16) * 2
}

fn pack_row(out: &mut Vec<u8>, image: &Image, x: i32, y: i32, count: usize, mode: PeekMode) {
    let bits = mode.bits() as usize;
    let start = out.len();
    out.resize(start + row_bytes(count, mode), 0);
    for i in 0..count {
        let sample = image
            .pixel(x + i as i32, y)
            .map_or(0, |p| quantize(p, mode));
        let bit = i * bits;
        out[start + bit / 8] |= sample << (bit % 8);
    }
}

/// `count` pixels of row `y` starting at column `x`
pub fn peek_line(image: &Image, x: i32, y: i32, count: i32, mode: PeekMode) -> Vec<u8> {
    let count = count.max(0) as usize;
    let mut out = Vec::with_capacity(row_bytes(count, mode));
    pack_row(&mut out, image, x, y, count, mode);
    out
}

/// Every row of `rect`, each padded independently
pub fn get_image(image: &Image, rect: Rect, mode: PeekMode) -> Vec<u8> {
    let count = rect.width().max(0) as usize;
    let rows = rect.height().max(0) as usize;
    let mut out = Vec::with_capacity(row_bytes(count, mode) * rows);
    for y in rect.y()..rect.y() + rows as i32 {
        pack_row(&mut out, image, rect.x(), y, count, mode);
    }
    out
}
