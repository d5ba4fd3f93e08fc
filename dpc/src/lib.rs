//! DPC - defective pixel correction stage of an ISP simulator.
//!
//! The core flags pixels that are both a range outlier against their
//! distance-2 neighbors and isolated from all immediate neighbors, then
//! replaces them by interpolating along the smoothest of four axes:
//! - Clamp-to-edge sampling (`sampler`)
//! - Two-stage defect test (`detector`)
//! - Gradient-directed interpolation (`corrector`)
//! - Full-frame passes, parallel and sequential (`pipeline`)
//!
//! Around the core sit the simulator adapters: register configuration,
//! the text pixel format, cropping, synthetic frames and output diffing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dpc::{process, FrameConfig};
//!
//! let config = FrameConfig::new(5, 5, true, 10);
//! let mut pixels = vec![0u16; 25];
//! pixels[12] = 100;
//!
//! let corrected = process(&pixels, &config)?;
//! assert!(corrected.iter().all(|&v| v == 0));
//! ```

mod config;
mod error;
mod pipeline;

pub mod corrector;
pub mod detector;
pub mod sampler;

pub mod compare;
pub mod crop;
pub mod pixel_text;
pub mod registers;
pub mod synthetic;

// ============================================================================
// Core
// ============================================================================

pub use config::{ConfigField, DpcParams, FrameConfig, FrameParams, DEFAULT_THRESHOLD};
pub use corrector::Direction;
pub use detector::PixelClass;
pub use error::{Error, Result};
pub use pipeline::{correct_frame, correct_frame_sequential, detect_defects, process, DpcOutput};

// ============================================================================
// Adapters
// ============================================================================

pub use compare::{compare, CompareReport, Mismatch};
pub use crop::CropWindow;
pub use pixel_text::Radix;
pub use registers::{RegisterInfo, SimConfig};

pub use common::Buffer2;
