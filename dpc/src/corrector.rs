//! Gradient-directed replacement of defective pixels.
//!
//! Second differences are measured along four axes at distance 2; the axis
//! with the smallest one is assumed to follow local structure, and the pixel
//! is replaced by the floor average of its two distance-1 neighbors on it.

use common::Buffer2;

use crate::sampler::sample_offset;

/// Interpolation axis.
///
/// Declaration order is the tie-break priority when two gradients are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum Direction {
    Vertical,
    Horizontal,
    /// Upper-left to lower-right.
    DiagonalDown,
    /// Lower-left to upper-right.
    DiagonalUp,
}

impl Direction {
    pub const PRIORITY: [Direction; 4] = [
        Direction::Vertical,
        Direction::Horizontal,
        Direction::DiagonalDown,
        Direction::DiagonalUp,
    ];

    /// Unit step `(dx, dy)` along the axis.
    #[inline]
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Vertical => (0, 1),
            Direction::Horizontal => (1, 0),
            Direction::DiagonalDown => (1, 1),
            Direction::DiagonalUp => (1, -1),
        }
    }

    /// `(-dx, -dy)` and `(dx, dy)` scaled by `distance`.
    #[inline]
    fn pair(self, distance: isize) -> [(isize, isize); 2] {
        let (dx, dy) = self.step();
        [(-dx * distance, -dy * distance), (dx * distance, dy * distance)]
    }
}

/// Absolute second difference `|2 * p0 - a - b|` at distance 2 along `direction`.
pub fn gradient(src: &Buffer2<u16>, x: usize, y: usize, direction: Direction) -> u32 {
    let p0 = i32::from(src[(x, y)]);
    let [a, b] = direction
        .pair(2)
        .map(|offset| i32::from(sample_offset(src, x, y, offset)));
    (2 * p0 - a - b).unsigned_abs()
}

/// Gradients in [`Direction::PRIORITY`] order.
pub fn gradients(src: &Buffer2<u16>, x: usize, y: usize) -> [u32; 4] {
    Direction::PRIORITY.map(|direction| gradient(src, x, y, direction))
}

/// Picks the smallest gradient; ties go to the earlier direction in [`Direction::PRIORITY`].
pub fn select_direction(gradients: &[u32; 4]) -> Direction {
    let mut best = 0;
    for (i, &g) in gradients.iter().enumerate().skip(1) {
        if g < gradients[best] {
            best = i;
        }
    }
    Direction::PRIORITY[best]
}

/// Floor average of the two distance-1 neighbors along `direction`.
pub fn interpolate(src: &Buffer2<u16>, x: usize, y: usize, direction: Direction) -> u16 {
    let [a, b] = direction
        .pair(1)
        .map(|offset| u32::from(sample_offset(src, x, y, offset)));
    // The average of two u16 values always fits in u16.
    ((a + b) / 2) as u16
}

/// Replacement value for a pixel already classified as defective.
pub fn correct_pixel(src: &Buffer2<u16>, x: usize, y: usize) -> u16 {
    let direction = select_direction(&gradients(src, x, y));
    interpolate(src, x, y, direction)
}
