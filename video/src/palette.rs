//! Fixed colour palettes for the indexed bitmap modes.

/// 16-colour palette, 0xRRGGBB
pub const PALETTE16: [u32; 16] = [
    0x000000, 0x555555, 0x800000, 0x808000, 0x008000, 0xFF0000, 0xFFFF00, 0x00FF00, 0xFF00FF,
    0x0000FF, 0x00FFFF, 0x800080, 0x000080, 0x008080, 0xAAAAAA, 0xFFFFFF,
];

/// Intensities that are not on the 0x33 colour cube grid
const RAMP_LEVELS: [u32; 10] = [0x11, 0x22, 0x44, 0x55, 0x77, 0x88, 0xAA, 0xBB, 0xDD, 0xEE];

const fn build_palette256() -> [u32; 256] {
    let mut out = [0u32; 256];
    let mut i = 0;

    // 6x6x6 cube, blue varying fastest
    while i < 216 {
        let r = (i / 36) as u32 * 0x33;
        let g = ((i / 6) % 6) as u32 * 0x33;
        let b = (i % 6) as u32 * 0x33;
        out[i] = (r << 16) | (g << 8) | b;
        i += 1;
    }

    // grey, red, green and blue ramps between the cube steps
    let mut ramp = 0;
    while ramp < 4 {
        let mut step = 0;
        while step < RAMP_LEVELS.len() {
            let v = RAMP_LEVELS[step];
            out[i] = match ramp {
                0 => (v << 16) | (v << 8) | v,
                1 => v << 16,
                2 => v << 8,
                _ => v,
            };
            i += 1;
            step += 1;
        }
        ramp += 1;
    }
    out
}

/// 256-colour palette, 0xRRGGBB
pub static PALETTE256: [u32; 256] = build_palette256();

#[inline]
fn channel_distance(a: u32, b: u32) -> u32 {
    let mut sum = 0;
    for shift in [16, 8, 0] {
        let ca = ((a >> shift) & 0xFF) as i32;
        let cb = ((b >> shift) & 0xFF) as i32;
        sum += ((ca - cb) * (ca - cb)) as u32;
    }
    sum
}

/// Index of the entry closest to `rgb` (first wins on ties)
pub fn nearest_index(palette: &[u32], rgb: u32) -> usize {
    let rgb = rgb & 0x00FF_FFFF;
    palette
        .iter()
        .enumerate()
        .min_by_key(|&(idx, &entry)| (channel_distance(entry, rgb), idx))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
