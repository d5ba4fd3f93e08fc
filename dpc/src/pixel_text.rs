//! Line-oriented text encoding of pixel frames.
//!
//! Written files hold one zero-padded hex value per line followed by a
//! `# (row, col)` annotation:
//!
//! ```text
//! 0000  # (   0,    0)
//! 00ff  # (   0,    1)
//! ```
//!
//! The reader accepts any number of whitespace-separated values per line and
//! ignores everything after `#`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use common::Buffer2;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    #[default]
    Hex,
    Decimal,
}

impl Radix {
    fn base(self) -> u32 {
        match self {
            Radix::Hex => 16,
            Radix::Decimal => 10,
        }
    }
}

/// Hex digits per value for a given sensor bit depth.
pub fn hex_digits(bit_depth: u32) -> usize {
    if bit_depth <= 8 {
        2
    } else {
        4
    }
}

pub fn parse(text: &str, radix: Radix) -> Result<Vec<u16>> {
    let mut pixels = Vec::new();

    for (line_idx, line) in text.lines().enumerate() {
        let content = line.split_once('#').map_or(line, |(before, _)| before);
        for token in content.split_whitespace() {
            let value = parse_value(token, radix).ok_or_else(|| Error::ParsePixel {
                line: line_idx + 1,
                text: token.to_string(),
            })?;
            pixels.push(value);
        }
    }

    Ok(pixels)
}

fn parse_value(token: &str, radix: Radix) -> Option<u16> {
    let digits = match radix {
        Radix::Hex => token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token),
        Radix::Decimal => token,
    };
    if digits.starts_with('+') {
        return None;
    }
    u16::from_str_radix(digits, radix.base()).ok()
}

pub fn format(image: &Buffer2<u16>, digits: usize) -> String {
    // "0000  # (   0,    0)\n"
    let mut out = String::with_capacity(image.len() * (digits + 17));
    for (idx, value) in image.iter().enumerate() {
        let (col, row) = image.coords_of(idx);
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{value:0digits$x}  # ({row:4}, {col:4})");
    }
    out
}

pub fn read_file(path: &Path, radix: Radix) -> Result<Vec<u16>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pixels = parse(&text, radix)?;
    tracing::debug!(path = %path.display(), pixels = pixels.len(), "Read pixel file");
    Ok(pixels)
}

/// Writes `image` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, image: &Buffer2<u16>, digits: usize) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, format(image, digits)).map_err(io_err)?;

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Wrote pixel file"
    );
    Ok(())
}
