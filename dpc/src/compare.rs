//! Pixel-exact comparison of frames, e.g. a reference model output against an HLS output.

use common::Buffer2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: u16,
    pub actual: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareReport {
    pub expected_len: usize,
    pub actual_len: usize,
    /// Mismatches over the common prefix of both sequences.
    pub mismatches: Vec<Mismatch>,
}

impl CompareReport {
    pub fn length_matches(&self) -> bool {
        self.expected_len == self.actual_len
    }

    pub fn is_identical(&self) -> bool {
        self.length_matches() && self.mismatches.is_empty()
    }

    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }
}

/// Compares two pixel sequences element by element.
pub fn compare(expected: &[u16], actual: &[u16]) -> CompareReport {
    let mismatches = expected
        .iter()
        .zip(actual)
        .enumerate()
        .filter(|(_, (e, a))| e != a)
        .map(|(index, (&expected, &actual))| Mismatch {
            index,
            expected,
            actual,
        })
        .collect();

    CompareReport {
        expected_len: expected.len(),
        actual_len: actual.len(),
        mismatches,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelChange {
    pub x: usize,
    pub y: usize,
    pub before: u16,
    pub after: u16,
}

/// Pixels that differ between two frames of the same shape.
pub fn changed_pixels(before: &Buffer2<u16>, after: &Buffer2<u16>) -> Vec<PixelChange> {
    assert!(
        before.same_dims(after),
        "frames must have the same dimensions"
    );
    compare(before, after)
        .mismatches
        .into_iter()
        .map(|m| {
            let (x, y) = before.coords_of(m.index);
            PixelChange {
                x,
                y,
                before: m.expected,
                after: m.actual,
            }
        })
        .collect()
}
