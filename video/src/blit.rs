//! Block transfers: copy, multi-copy, inline bitmaps, pattern fill and scroll.

use opal_abi::{Color, MaskedBitmap, Mode, OplError, OplResult, PatternSource, Point, Rect, Size};
use opal_lib::{klog_error, klog_warn};

use crate::canvas::{BLACK_PIXEL, Canvas, Image, WHITE, is_opaque};
use crate::codec;
use crate::graphics::{DrawContext, Painter};

/// Clamp a copy of `src_rect` to `dest` so both ends stay in bounds.
///
/// Whatever is cut from one side is cut from the other, keeping the
/// source-to-destination offset fixed. `None` when nothing remains.
pub fn clamp_copy(src_rect: Rect, src_size: Size, dest: Point, dst_size: Size) -> Option<(Rect, Point)> {
    let src = src_rect.clip_to(src_size)?;
    let dest_rect = Rect::from_parts(
        dest.offset(src.x() - src_rect.x(), src.y() - src_rect.y()),
        src.size,
    );
    let dst = dest_rect.clip_to(dst_size)?;
    let src = Rect::from_parts(
        src.origin.offset(dst.x() - dest_rect.x(), dst.y() - dest_rect.y()),
        dst.size,
    );
    Some((src, dst.origin))
}

/// Copy part of `image`. With a mask, only pixels where the mask is dark
/// are transferred; the mask is read at the same offset from `mask_origin`.
pub fn copy(
    painter: &mut Painter<'_>,
    image: &Image,
    src_rect: Rect,
    dest: Point,
    mask: Option<(&Image, Point)>,
) {
    let dst_size = painter.canvas().size();
    let Some((src, at)) = clamp_copy(src_rect, image.size, dest, dst_size) else {
        return;
    };
    for y in 0..src.height() {
        for x in 0..src.width() {
            let (sx, sy) = (src.x() + x, src.y() + y);
            if let Some((mask, mask_origin)) = mask {
                let selected = mask
                    .pixel(
                        mask_origin.x + sx - src_rect.x(),
                        mask_origin.y + sy - src_rect.y(),
                    )
                    .is_some_and(|m| codec::luma(m) < 0x80);
                if !selected {
                    continue;
                }
            }
            if let Some(px) = image.pixel(sx, sy).filter(|&p| is_opaque(p)) {
                painter.blend(at.x + x, at.y + y, px);
            }
        }
    }
}

/// Several rectangles from one source; `rects[i]` lands at `points[i]`
pub fn mcopy(painter: &mut Painter<'_>, image: &Image, rects: &[Rect], points: &[Point]) -> OplResult<()> {
    if rects.len() != points.len() {
        return Err(OplError::InvalidArgs);
    }
    if matches!(painter.pen().mode, Mode::Set | Mode::Replace) {
        klog_warn!("mcopy: {:?} mode is not expected here", painter.pen().mode);
    }
    for (rect, point) in rects.iter().zip(points) {
        copy(painter, image, *rect, *point, None);
    }
    Ok(())
}

/// Draw an inline bitmap with its optional mask at `origin`
pub fn bitblt(painter: &mut Painter<'_>, origin: Point, masked: &MaskedBitmap) -> OplResult<()> {
    if !masked.is_well_formed() {
        klog_error!("bitblt: malformed bitmap {}x{}", masked.bitmap.width, masked.bitmap.height);
        return Err(opal_abi::CodecError::InvalidBitmap.into());
    }
    let size = masked.bitmap.size();
    let pixels = codec::decode(&masked.bitmap)?;
    let alpha = match &masked.mask {
        Some(mask) => Some(
            Image {
                size,
                pixels: codec::decode(mask)?,
            }
            .inverted_mask(),
        ),
        None => None,
    };
    let image = Image { size, pixels };
    for y in 0..size.height {
        for x in 0..size.width {
            let visible = alpha
                .as_ref()
                .is_none_or(|a| a.pixel(x, y).is_some_and(is_opaque));
            if !visible {
                continue;
            }
            if let Some(px) = image.pixel(x, y) {
                painter.blend(origin.x + x, origin.y + y, px);
            }
        }
    }
    Ok(())
}

fn dither_tile() -> Image {
    Image {
        size: Size::new(2, 2),
        pixels: vec![BLACK_PIXEL, WHITE, WHITE, BLACK_PIXEL],
    }
}

/// Tile a source over `rect`, anchored at the rect's top-left
pub fn pattern(
    painter: &mut Painter<'_>,
    src: PatternSource,
    rect: Rect,
    ctx: &DrawContext<'_>,
) -> OplResult<()> {
    let dither;
    let tile: &Image = match src {
        PatternSource::Dither => {
            dither = dither_tile();
            &dither
        }
        PatternSource::Drawable(id) => ctx.source(id)?,
    };
    if tile.size.is_empty() {
        return Ok(());
    }
    let Some(clip) = rect.clip_to(painter.canvas().size()) else {
        return Ok(());
    };
    for y in clip.y()..clip.max_y() {
        let ty = (y - rect.y()).rem_euclid(tile.size.height);
        for x in clip.x()..clip.max_x() {
            let tx = (x - rect.x()).rem_euclid(tile.size.width);
            if let Some(px) = tile.pixel(tx, ty).filter(|&p| is_opaque(p)) {
                painter.blend(x, y, px);
            }
        }
    }
    Ok(())
}

/// Move the contents of `rect` by (`dx`, `dy`).
///
/// The union of the old and new areas is cleared first, which over-clears
/// when both offsets are non-zero.
pub fn scroll(canvas: &mut Canvas, bg: Color, dx: i32, dy: i32, rect: Rect) {
    let Some(clip) = rect.clip_to(canvas.size()) else {
        return;
    };
    let snapshot = canvas.image();
    let shifted = clip.translated(dx, dy);
    canvas.fill_rect(clip.union(&shifted), bg);
    for y in 0..clip.height() {
        for x in 0..clip.width() {
            if let Some(px) = snapshot.pixel(clip.x() + x, clip.y() + y) {
                canvas.set_pixel(shifted.x() + x, shifted.y() + y, px);
            }
        }
    }
}
