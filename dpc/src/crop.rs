//! Inclusive rectangular crop ahead of the DPC stage.

use serde::{Deserialize, Serialize};

use common::Buffer2;

use crate::error::{Error, Result};

/// Crop rectangle with inclusive end coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropWindow {
    pub enabled: bool,
    pub start_x: i64,
    pub start_y: i64,
    pub end_x: i64,
    pub end_y: i64,
}

/// Validated crop bounds, all inside the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CropRect {
    pub fn width(&self) -> usize {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0 + 1
    }
}

impl CropWindow {
    pub fn new(start_x: i64, start_y: i64, end_x: i64, end_y: i64) -> Self {
        Self {
            enabled: true,
            start_x,
            start_y,
            end_x,
            end_y,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Bounds of the window inside a `width x height` frame, or `None` when disabled.
    pub fn rect(&self, width: usize, height: usize) -> Result<Option<CropRect>> {
        if !self.enabled {
            return Ok(None);
        }

        let invalid = |reason: &str| Error::InvalidCrop {
            reason: reason.to_string(),
        };

        let coords = [self.start_x, self.start_y, self.end_x, self.end_y];
        if coords.iter().any(|&c| c < 0) {
            return Err(invalid("negative coordinates are not allowed"));
        }
        if self.start_x > self.end_x || self.start_y > self.end_y {
            return Err(invalid("start coordinates must not exceed end coordinates"));
        }

        let [x0, y0, x1, y1] = coords.map(|c| usize::try_from(c).unwrap_or(usize::MAX));
        if x1 >= width || y1 >= height {
            return Err(Error::InvalidCrop {
                reason: format!(
                    "window ({x0}, {y0})..=({x1}, {y1}) exceeds {width}x{height} frame"
                ),
            });
        }

        Ok(Some(CropRect { x0, y0, x1, y1 }))
    }

    /// Frame size after cropping a `width x height` frame.
    pub fn output_dims(&self, width: usize, height: usize) -> Result<(usize, usize)> {
        Ok(match self.rect(width, height)? {
            Some(rect) => (rect.width(), rect.height()),
            None => (width, height),
        })
    }

    /// Copies the window out of `image`; a disabled window copies the whole frame.
    pub fn apply(&self, image: &Buffer2<u16>) -> Result<Buffer2<u16>> {
        let (width, height) = image.dims();
        match self.rect(width, height)? {
            Some(rect) => {
                let cropped = image.sub_rect(rect.x0, rect.y0, rect.x1, rect.y1);
                tracing::debug!(
                    src_width = width,
                    src_height = height,
                    width = cropped.width(),
                    height = cropped.height(),
                    "Cropped frame"
                );
                Ok(cropped)
            }
            None => Ok(image.clone()),
        }
    }
}
