//! Two-stage defect test.
//!
//! A pixel is defective when it lies strictly outside the range of its
//! distance-2 same-color neighbors AND differs from every immediate neighbor
//! by more than the threshold.

use common::Buffer2;

use crate::sampler::sample_offset;

/// Distance-2 neighbors used for the coarse range test.
pub const COARSE_OFFSETS: [(isize, isize); 8] = [
    (-2, -2),
    (-2, 0),
    (-2, 2),
    (0, -2),
    (0, 2),
    (2, -2),
    (2, 0),
    (2, 2),
];

/// Immediate neighbors, scanned in this order by the isolation test.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Normal,
    Defective,
}

pub fn classify(src: &Buffer2<u16>, threshold: u32, x: usize, y: usize) -> PixelClass {
    let p0 = src[(x, y)];

    // The isolation test only runs for range outliers.
    if !outside_coarse_range(src, x, y, p0) {
        return PixelClass::Normal;
    }

    if isolated_from_neighbors(src, threshold, x, y, p0) {
        PixelClass::Defective
    } else {
        PixelClass::Normal
    }
}

#[inline]
pub fn is_defective(src: &Buffer2<u16>, threshold: u32, x: usize, y: usize) -> bool {
    classify(src, threshold, x, y) == PixelClass::Defective
}

fn outside_coarse_range(src: &Buffer2<u16>, x: usize, y: usize, p0: u16) -> bool {
    let (min_n, max_n) = COARSE_OFFSETS
        .iter()
        .map(|&offset| sample_offset(src, x, y, offset))
        .fold((u16::MAX, u16::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

    p0 < min_n || p0 > max_n
}

/// Stops at the first neighbor within `threshold` of `p0`.
fn isolated_from_neighbors(src: &Buffer2<u16>, threshold: u32, x: usize, y: usize, p0: u16) -> bool {
    NEIGHBOR_OFFSETS
        .iter()
        .all(|&offset| u32::from(p0.abs_diff(sample_offset(src, x, y, offset))) > threshold)
}
