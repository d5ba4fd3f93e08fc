//! Error types for the DPC stage and its file adapters.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigField;

/// Errors that can occur while configuring or running the DPC stage.
///
/// Configuration and size errors are raised before any pixel is processed;
/// no partial output is ever returned alongside them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: ConfigField, value: i64 },

    #[error(
        "Image size mismatch for {width}x{height} frame: expected {expected} pixels, got {actual}"
    )]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid crop window: {reason}")]
    InvalidCrop { reason: String },

    #[error("Invalid bit depth {bits}, expected 1..=16")]
    InvalidBitDepth { bits: u32 },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported config file '{path}': {source}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: common::FileExtensionError,
    },

    #[error("Failed to parse config '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: common::SerdeFormatError,
    },

    #[error("Invalid pixel value '{text}' on line {line}")]
    ParsePixel { line: usize, text: String },

    #[error("Invalid register table line {line}: {reason}")]
    InvalidRegisterTable { line: usize, reason: String },

    #[error("Missing register '{name}'")]
    MissingRegister { name: String },

    #[error("Register '{name}' value {value} outside [{min}, {max}]")]
    RegisterOutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
