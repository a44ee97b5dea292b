//! Sample synthesis outside the valid range of a line.
//!
//! Every backend correlates a *padded* copy of the input: the line plus
//! `radius` samples on either side. This module builds that copy once per line
//! (or block of lines) so the arithmetic never has to look at border policies.

use std::fmt;

use super::convolution::{LineShape, StridedLines};
use crate::error::FilterError;

/// How the samples beyond either end of a line are obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderTreatment {
    /// Reflect across the boundary, repeating the edge sample: `-1 -> 0`, `-2 -> 1`.
    #[default]
    Mirror,
    /// Replicate the nearest valid sample.
    Optimistic,
    /// Read caller supplied ghost samples.
    Pointer,
}

impl BorderTreatment {
    /// Map a position of a line with `n` samples onto `0..n`.
    ///
    /// Positions inside the line are returned unchanged. Returns `None` for
    /// [`BorderTreatment::Pointer`], whose samples do not come from the line.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_imgproc::filter::BorderTreatment;
    ///
    /// assert_eq!(BorderTreatment::Mirror.map_index(-2, 5), Some(1));
    /// assert_eq!(BorderTreatment::Mirror.map_index(6, 5), Some(3));
    /// assert_eq!(BorderTreatment::Optimistic.map_index(-2, 5), Some(0));
    /// assert_eq!(BorderTreatment::Pointer.map_index(-2, 5), None);
    /// ```
    #[inline]
    pub fn map_index(self, index: isize, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        match self {
            BorderTreatment::Mirror => {
                let period = 2 * n;
                let m = index.rem_euclid(period as isize) as usize;
                Some(if m >= n { period - 1 - m } else { m })
            }
            BorderTreatment::Optimistic => Some(index.clamp(0, n as isize - 1) as usize),
            BorderTreatment::Pointer => None,
        }
    }
}

/// One end of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineEnd {
    /// Before sample `0`.
    Left,
    /// After sample `n - 1`.
    Right,
}

impl fmt::Display for LineEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineEnd::Left => "left",
            LineEnd::Right => "right",
        })
    }
}

/// Ghost samples for one end of every line of a convolution call.
///
/// Line `o` owns `radius` samples starting at `o * outer_stride`. On the left
/// end they are positions `-radius..-1` (the first element is `-radius`); on
/// the right end they are positions `n..n + radius - 1`.
#[derive(Clone, Copy, Debug)]
pub struct GhostSamples<'a> {
    /// The samples.
    pub data: &'a [f32],
    /// Distance in elements between the samples of neighbouring lines.
    pub outer_stride: usize,
}

impl<'a> GhostSamples<'a> {
    /// Describe ghost samples stored `outer_stride` elements apart per line.
    pub fn new(data: &'a [f32], outer_stride: usize) -> Self {
        Self { data, outer_stride }
    }

    #[inline]
    fn line(&self, line: usize, radius: usize) -> &'a [f32] {
        let start = line * self.outer_stride;
        &self.data[start..start + radius]
    }
}

/// Border policy for the left and right end of every line.
#[derive(Clone, Copy, Debug)]
pub struct LineBorders<'a> {
    /// Policy before the first sample.
    pub left: BorderTreatment,
    /// Policy after the last sample.
    pub right: BorderTreatment,
    /// Ghost samples read when `left` is [`BorderTreatment::Pointer`].
    pub left_ghost: Option<GhostSamples<'a>>,
    /// Ghost samples read when `right` is [`BorderTreatment::Pointer`].
    pub right_ghost: Option<GhostSamples<'a>>,
}

impl<'a> LineBorders<'a> {
    /// Independent policies for both ends, without ghost samples.
    pub fn new(left: BorderTreatment, right: BorderTreatment) -> Self {
        Self {
            left,
            right,
            left_ghost: None,
            right_ghost: None,
        }
    }

    /// The same policy on both ends.
    pub fn uniform(border: BorderTreatment) -> Self {
        Self::new(border, border)
    }

    /// Attach the ghost samples of the left end.
    pub fn with_left_ghost(mut self, ghost: GhostSamples<'a>) -> Self {
        self.left_ghost = Some(ghost);
        self
    }

    /// Attach the ghost samples of the right end.
    pub fn with_right_ghost(mut self, ghost: GhostSamples<'a>) -> Self {
        self.right_ghost = Some(ghost);
        self
    }

    /// Whether either end reads ghost samples.
    pub fn uses_pointer(&self) -> bool {
        self.left == BorderTreatment::Pointer || self.right == BorderTreatment::Pointer
    }

    /// Whether both ends read ghost samples.
    pub fn all_pointer(&self) -> bool {
        self.left == BorderTreatment::Pointer && self.right == BorderTreatment::Pointer
    }

    /// Check that every pointer end has a buffer covering all lines.
    pub(crate) fn validate(&self, shape: LineShape, radius: usize) -> Result<(), FilterError> {
        let ends = [
            (LineEnd::Left, self.left, self.left_ghost),
            (LineEnd::Right, self.right, self.right_ghost),
        ];
        for (end, treatment, ghost) in ends {
            if treatment != BorderTreatment::Pointer {
                continue;
            }
            let ghost = ghost.ok_or(FilterError::MissingBorderBuffer(end))?;
            let required = (shape.n_outer - 1) * ghost.outer_stride + radius;
            if ghost.data.len() < required {
                return Err(FilterError::BorderBufferTooShort {
                    end,
                    len: ghost.data.len(),
                    required,
                });
            }
        }
        Ok(())
    }
}

/// Copy line `line` of `src` into `out` with `radius` border samples on each side.
///
/// `out` must hold `n_pixels + 2 * radius` samples; afterwards
/// `out[radius + i]` is sample `i` of the line for `i` in `-radius..n_pixels + radius`.
pub(crate) fn pad_line(
    src: &StridedLines<'_>,
    line: usize,
    n_pixels: usize,
    radius: usize,
    borders: &LineBorders<'_>,
    out: &mut [f32],
) {
    let base = line * src.strides.outer;
    let pixel = src.strides.pixel;
    let (left, rest) = out.split_at_mut(radius);
    let (body, right) = rest.split_at_mut(n_pixels);

    if pixel == 1 {
        body.copy_from_slice(&src.data[base..base + n_pixels]);
    } else {
        for (i, v) in body.iter_mut().enumerate() {
            *v = src.data[base + i * pixel];
        }
    }

    match (borders.left, borders.left_ghost) {
        (BorderTreatment::Pointer, Some(ghost)) => left.copy_from_slice(ghost.line(line, radius)),
        (treatment, _) => {
            for (j, v) in left.iter_mut().enumerate() {
                let index = j as isize - radius as isize;
                if let Some(i) = treatment.map_index(index, n_pixels) {
                    *v = body[i];
                }
            }
        }
    }

    match (borders.right, borders.right_ghost) {
        (BorderTreatment::Pointer, Some(ghost)) => right.copy_from_slice(ghost.line(line, radius)),
        (treatment, _) => {
            for (k, v) in right.iter_mut().enumerate() {
                if let Some(i) = treatment.map_index((n_pixels + k) as isize, n_pixels) {
                    *v = body[i];
                }
            }
        }
    }
}

/// Copy `width` neighbouring lines starting at `first_line` into a transposed block.
///
/// Row `radius + p` of `out` holds sample `p` of every line, so `out` must hold
/// `(n_pixels + 2 * radius) * width` samples and lane `l` of a row belongs to
/// line `first_line + l`.
pub(crate) fn pad_block(
    src: &StridedLines<'_>,
    first_line: usize,
    width: usize,
    n_pixels: usize,
    radius: usize,
    borders: &LineBorders<'_>,
    out: &mut [f32],
) {
    let outer = src.strides.outer;
    let base = first_line * outer;

    for p in 0..n_pixels {
        let row = &mut out[(radius + p) * width..(radius + p + 1) * width];
        let start = base + p * src.strides.pixel;
        if outer == 1 {
            row.copy_from_slice(&src.data[start..start + width]);
        } else {
            for (l, v) in row.iter_mut().enumerate() {
                *v = src.data[start + l * outer];
            }
        }
    }

    let ends = [
        (borders.left, borders.left_ghost, 0, -(radius as isize)),
        (borders.right, borders.right_ghost, radius + n_pixels, n_pixels as isize),
    ];
    for (treatment, ghost, first_row, first_index) in ends {
        for k in 0..radius {
            let row = first_row + k;
            match (treatment, ghost) {
                (BorderTreatment::Pointer, Some(ghost)) => {
                    let dst = &mut out[row * width..(row + 1) * width];
                    for (l, v) in dst.iter_mut().enumerate() {
                        *v = ghost.data[(first_line + l) * ghost.outer_stride + k];
                    }
                }
                (treatment, _) => {
                    if let Some(i) = treatment.map_index(first_index + k as isize, n_pixels) {
                        let from = (radius + i) * width;
                        out.copy_within(from..from + width, row * width);
                    }
                }
            }
        }
    }
}
