//! Frame configuration as delivered by the register file, and its validated form.

use serde::{Deserialize, Serialize};

use common::Buffer2;

use crate::error::{Error, Result};

/// Threshold used by the reference register table when none is configured.
pub const DEFAULT_THRESHOLD: u32 = 30;

/// Configuration field named in [`Error::InvalidConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigField {
    Width,
    Height,
    Threshold,
}

/// Raw frame configuration.
///
/// Fields are signed because they come straight from register values;
/// [`FrameConfig::validate`] rejects anything the pipeline can't run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub width: i64,
    pub height: i64,
    pub enabled: bool,
    pub threshold: i64,
}

impl FrameConfig {
    pub fn new(width: i64, height: i64, enabled: bool, threshold: i64) -> Self {
        Self {
            width,
            height,
            enabled,
            threshold,
        }
    }

    pub fn validate(&self) -> Result<FrameParams> {
        let width = positive_dim(ConfigField::Width, self.width)?;
        let height = positive_dim(ConfigField::Height, self.height)?;
        width
            .checked_mul(height)
            .ok_or(Error::InvalidConfig {
                field: ConfigField::Height,
                value: self.height,
            })?;
        if self.threshold < 0 {
            return Err(Error::InvalidConfig {
                field: ConfigField::Threshold,
                value: self.threshold,
            });
        }
        // Pixel differences never exceed u16::MAX, so a larger threshold already
        // means "nothing is defective".
        let threshold = u32::try_from(self.threshold).unwrap_or(u32::MAX);

        Ok(FrameParams {
            width,
            height,
            dpc: DpcParams::new(self.enabled, threshold),
        })
    }
}

fn positive_dim(field: ConfigField, value: i64) -> Result<usize> {
    match usize::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::InvalidConfig { field, value }),
    }
}

/// Per-run DPC settings. Immutable for the duration of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpcParams {
    pub enabled: bool,
    pub threshold: u32,
}

impl DpcParams {
    pub fn new(enabled: bool, threshold: u32) -> Self {
        Self { enabled, threshold }
    }

    pub fn disabled() -> Self {
        Self::new(false, DEFAULT_THRESHOLD)
    }
}

impl Default for DpcParams {
    fn default() -> Self {
        Self::new(true, DEFAULT_THRESHOLD)
    }
}

/// Validated configuration: positive dimensions and a non-negative threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub width: usize,
    pub height: usize,
    pub dpc: DpcParams,
}

impl FrameParams {
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn check_len(&self, actual: usize) -> Result<()> {
        let expected = self.pixel_count();
        if actual != expected {
            return Err(Error::SizeMismatch {
                width: self.width,
                height: self.height,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Wraps `pixels` into a frame of the configured shape.
    pub fn frame(&self, pixels: Vec<u16>) -> Result<Buffer2<u16>> {
        self.check_len(pixels.len())?;
        Ok(Buffer2::new(self.width, self.height, pixels))
    }
}
