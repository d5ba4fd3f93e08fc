//! Full-frame DPC pass.
//!
//! Every lookup reads the unmodified input frame and results go to a separate
//! output buffer, so pixels can be visited in any order. The parallel pass
//! splits the output into row-aligned chunks; the sequential pass is the same
//! kernel over a single chunk.

use rayon::prelude::*;

use common::parallel::ParRowsMutExt;
use common::Buffer2;

use crate::config::{ConfigField, DpcParams, FrameConfig};
use crate::corrector::correct_pixel;
use crate::detector::is_defective;
use crate::error::{Error, Result};

/// Corrected frame plus the number of pixels that were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpcOutput {
    pub image: Buffer2<u16>,
    pub defect_count: usize,
}

/// Validates `config`, checks the pixel count and runs the DPC pass.
pub fn process(pixels: &[u16], config: &FrameConfig) -> Result<Vec<u16>> {
    let params = config.validate()?;
    params.check_len(pixels.len())?;
    let image = params.frame(pixels.to_vec())?;
    Ok(correct_frame(&image, params.dpc)?.image.into_vec())
}

/// Row-parallel DPC pass.
pub fn correct_frame(image: &Buffer2<u16>, params: DpcParams) -> Result<DpcOutput> {
    ensure_non_empty(image)?;
    let (width, height) = image.dims();

    if !params.enabled {
        tracing::debug!(width, height, "DPC disabled, passing frame through");
        return Ok(DpcOutput {
            image: image.clone(),
            defect_count: 0,
        });
    }

    let mut output = image.clone();
    let defect_count: usize = output
        .pixels_mut()
        .par_rows_mut_auto(width)
        .map(|(start_row, rows)| correct_rows(image, params.threshold, start_row, rows))
        .sum();

    tracing::info!(
        width,
        height,
        threshold = params.threshold,
        defect_count,
        "DPC pass complete"
    );

    Ok(DpcOutput {
        image: output,
        defect_count,
    })
}

/// Single-threaded DPC pass. Produces the same output as [`correct_frame`].
pub fn correct_frame_sequential(image: &Buffer2<u16>, params: DpcParams) -> Result<DpcOutput> {
    ensure_non_empty(image)?;

    let mut output = image.clone();
    let defect_count = if params.enabled {
        correct_rows(image, params.threshold, 0, output.pixels_mut())
    } else {
        0
    };

    Ok(DpcOutput {
        image: output,
        defect_count,
    })
}

/// Flat indices of all defective pixels, in row-major order. Nothing is corrected.
pub fn detect_defects(image: &Buffer2<u16>, threshold: u32) -> Vec<usize> {
    (0..image.len())
        .into_par_iter()
        .filter(|&idx| {
            let (x, y) = image.coords_of(idx);
            is_defective(image, threshold, x, y)
        })
        .collect()
}

/// Corrects the defective pixels of `rows`, which start at row `start_row` of `src`.
/// `rows` must already hold the input values.
fn correct_rows(src: &Buffer2<u16>, threshold: u32, start_row: usize, rows: &mut [u16]) -> usize {
    let width = src.width();
    let mut count = 0;

    for (row_offset, row) in rows.chunks_mut(width).enumerate() {
        let y = start_row + row_offset;
        for (x, out) in row.iter_mut().enumerate() {
            if is_defective(src, threshold, x, y) {
                *out = correct_pixel(src, x, y);
                count += 1;
            }
        }
    }

    count
}

fn ensure_non_empty(image: &Buffer2<u16>) -> Result<()> {
    let (width, height) = image.dims();
    if width == 0 {
        return Err(Error::InvalidConfig {
            field: ConfigField::Width,
            value: 0,
        });
    }
    if height == 0 {
        return Err(Error::InvalidConfig {
            field: ConfigField::Height,
            value: 0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(size: usize, background: u16, value: u16) -> Buffer2<u16> {
        let c = size / 2;
        Buffer2::from_fn(size, size, |x, y| {
            if x == c && y == c {
                value
            } else {
                background
            }
        })
    }

    #[test]
    fn test_hot_pixel_corrected() {
        let src = spike(5, 0, 100);
        let out = correct_frame(&src, DpcParams::new(true, 10)).unwrap();
        assert_eq!(out.defect_count, 1);
        assert!(out.image.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_high_threshold_keeps_frame() {
        let src = spike(5, 0, 100);
        let out = correct_frame(&src, DpcParams::new(true, 150)).unwrap();
        assert_eq!(out.defect_count, 0);
        assert_eq!(out.image, src);
    }

    #[test]
    fn test_disabled_is_exact_copy() {
        let src = spike(7, 3, 4000);
        let out = correct_frame(&src, DpcParams::disabled()).unwrap();
        assert_eq!(out.image, src);
        assert_eq!(out.defect_count, 0);

        let out = correct_frame_sequential(&src, DpcParams::disabled()).unwrap();
        assert_eq!(out.image, src);
    }

    #[test]
    fn test_input_is_not_modified() {
        let src = spike(5, 0, 100);
        let before = src.clone();
        let _ = correct_frame(&src, DpcParams::new(true, 10)).unwrap();
        assert_eq!(src, before);
    }

    #[test]
    fn test_neighbors_read_input_values() {
        // Two adjacent hot pixels: each sees the other's input value, so neither
        // is isolated and both survive regardless of visiting order.
        let mut src = Buffer2::new_filled(7, 7, 0u16);
        src[(3, 3)] = 500;
        src[(4, 3)] = 505;
        let out = correct_frame(&src, DpcParams::new(true, 10)).unwrap();
        assert_eq!(out.defect_count, 0);
        assert_eq!(out.image, src);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let src = Buffer2::from_fn(37, 29, |x, y| ((x * 7919 + y * 104_729) % 1024) as u16);
        for threshold in [0, 5, 50, 500] {
            let params = DpcParams::new(true, threshold);
            let par = correct_frame(&src, params).unwrap();
            let seq = correct_frame_sequential(&src, params).unwrap();
            assert_eq!(par, seq, "threshold {threshold}");
        }
    }

    #[test]
    fn test_detect_defects_matches_correction_count() {
        let mut src = Buffer2::new_filled(16, 12, 100u16);
        src[(3, 4)] = 1000;
        src[(10, 2)] = 0;
        src[(14, 9)] = 900;
        let defects = detect_defects(&src, 20);
        assert_eq!(defects, vec![2 * 16 + 10, 4 * 16 + 3, 9 * 16 + 14]);

        let out = correct_frame(&src, DpcParams::new(true, 20)).unwrap();
        assert_eq!(out.defect_count, defects.len());
        assert!(out.image.iter().all(|&v| v == 100));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let src = Buffer2::<u16>::new(0, 0, Vec::new());
        assert!(matches!(
            correct_frame(&src, DpcParams::default()),
            Err(Error::InvalidConfig {
                field: ConfigField::Width,
                ..
            })
        ));
        assert!(correct_frame_sequential(&src, DpcParams::default()).is_err());
    }

    #[test]
    fn test_process_validates_before_running() {
        let err = process(&[0; 10], &FrameConfig::new(4, 4, true, 10)).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));

        let err = process(&[0; 16], &FrameConfig::new(4, 4, true, -1)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
