//! Clamp-to-edge pixel sampling.

use common::Buffer2;

/// Reads `src` at `(x, y)`, clamping each coordinate into the frame.
///
/// Out-of-range coordinates replicate the nearest edge pixel. The frame must
/// be non-empty.
#[inline]
pub fn sample(src: &Buffer2<u16>, x: isize, y: isize) -> u16 {
    debug_assert!(src.width() > 0 && src.height() > 0);
    let cx = x.clamp(0, src.width() as isize - 1) as usize;
    let cy = y.clamp(0, src.height() as isize - 1) as usize;
    src[(cx, cy)]
}

/// Reads `src` at `(x + dx, y + dy)` with clamping.
#[inline]
pub fn sample_offset(src: &Buffer2<u16>, x: usize, y: usize, (dx, dy): (isize, isize)) -> u16 {
    sample(src, x as isize + dx, y as isize + dy)
}
