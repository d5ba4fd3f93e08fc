//! Seeded synthetic sensor frames for simulation runs and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::Buffer2;

use crate::error::{Error, Result};

/// Largest pixel value representable with `bit_depth` bits.
pub fn max_value(bit_depth: u32) -> Result<u16> {
    if !(1..=16).contains(&bit_depth) {
        return Err(Error::InvalidBitDepth { bits: bit_depth });
    }
    Ok((u32::MAX >> (32 - bit_depth)) as u16)
}

/// Uniform random frame with values in `[0, 2^bit_depth - 1]`.
pub fn random_frame(width: usize, height: usize, bit_depth: u32, seed: u64) -> Result<Buffer2<u16>> {
    let max = max_value(bit_depth)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let frame = Buffer2::from_fn(width, height, |_, _| rng.random_range(0..=max));

    tracing::debug!(width, height, bit_depth, seed, "Generated random frame");
    Ok(frame)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectKind {
    /// Stuck at the maximum value.
    Hot,
    /// Stuck at zero.
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedDefect {
    pub x: usize,
    pub y: usize,
    pub kind: DefectKind,
}

/// Overwrites `count` random positions with hot or dead pixels.
///
/// Positions are drawn independently and may repeat; the last write wins.
pub fn inject_defects(
    image: &mut Buffer2<u16>,
    count: usize,
    bit_depth: u32,
    seed: u64,
) -> Result<Vec<InjectedDefect>> {
    let max = max_value(bit_depth)?;
    let (width, height) = image.dims();
    if count == 0 || image.is_empty() {
        return Ok(Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let defects: Vec<InjectedDefect> = (0..count)
        .map(|_| {
            let x = rng.random_range(0..width);
            let y = rng.random_range(0..height);
            let kind = if rng.random_bool(0.5) {
                DefectKind::Hot
            } else {
                DefectKind::Dead
            };
            image[(x, y)] = match kind {
                DefectKind::Hot => max,
                DefectKind::Dead => 0,
            };
            InjectedDefect { x, y, kind }
        })
        .collect();

    let hot = defects.iter().filter(|d| d.kind == DefectKind::Hot).count();
    tracing::debug!(count, hot, dead = count - hot, seed, "Injected defects");
    Ok(defects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(1).unwrap(), 1);
        assert_eq!(max_value(8).unwrap(), 255);
        assert_eq!(max_value(12).unwrap(), 4095);
        assert_eq!(max_value(16).unwrap(), u16::MAX);
        assert!(matches!(
            max_value(0),
            Err(Error::InvalidBitDepth { bits: 0 })
        ));
        assert!(max_value(17).is_err());
    }

    #[test]
    fn test_random_frame_in_range() {
        let frame = random_frame(64, 32, 10, 7).unwrap();
        assert_eq!(frame.dims(), (64, 32));
        assert!(frame.iter().all(|&v| v <= 1023));
        // 2048 draws over 1024 values should not all be equal.
        assert!(frame.iter().any(|&v| v != frame[0]));
    }

    #[test]
    fn test_random_frame_is_seeded() {
        let a = random_frame(16, 16, 12, 42).unwrap();
        let b = random_frame(16, 16, 12, 42).unwrap();
        let c = random_frame(16, 16, 12, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_inject_defects_writes_extremes() {
        let mut image = Buffer2::new_filled(20, 20, 500u16);
        let defects = inject_defects(&mut image, 10, 12, 3).unwrap();
        assert_eq!(defects.len(), 10);

        // Check the final write per position, since positions may repeat.
        for (i, d) in defects.iter().enumerate() {
            let overwritten = defects[i + 1..].iter().any(|o| o.x == d.x && o.y == d.y);
            if !overwritten {
                let expected = match d.kind {
                    DefectKind::Hot => 4095,
                    DefectKind::Dead => 0,
                };
                assert_eq!(image[(d.x, d.y)], expected);
            }
        }
        let untouched = image.iter().filter(|&&v| v == 500).count();
        assert!(untouched >= 400 - 10);
    }

    #[test]
    fn test_inject_zero_defects() {
        let mut image = Buffer2::new_filled(4, 4, 1u16);
        assert!(inject_defects(&mut image, 0, 8, 1).unwrap().is_empty());
        assert!(image.iter().all(|&v| v == 1));
    }
}
