use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::{CoaddError, Result};

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Pixel sample type accepted by the engine.
///
/// Sealed: only `f32` and `f64` implement it, so a frame stack is
/// type-uniform by construction. All intermediate arithmetic runs in `f64`.
pub trait Sample:
    Float + private::Sealed + Copy + Send + Sync + std::fmt::Debug + 'static
{
    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
}

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

/// A single 2-D grid of samples with an optional bad-sample mask.
///
/// Data is row-major, shape = (height, width). A mask entry of `true` marks
/// the sample at the same position as bad; masked samples never contribute
/// to a stacked output.
#[derive(Clone, Debug)]
pub struct Frame<T: Sample> {
    /// Sample data, shape = (height, width).
    pub data: Array2<T>,
    /// Optional bad-sample mask, same shape as `data`; `true` = bad.
    pub mask: Option<Array2<bool>>,
}

impl<T: Sample> Frame<T> {
    pub fn new(data: Array2<T>) -> Self {
        Self { data, mask: None }
    }

    /// Attach a bad-sample mask; its shape must match the data.
    pub fn with_mask(data: Array2<T>, mask: Array2<bool>) -> Result<Self> {
        if mask.dim() != data.dim() {
            return Err(CoaddError::IncompatibleInput(format!(
                "mask shape {:?} does not match frame shape {:?}",
                mask.dim(),
                data.dim()
            )));
        }
        Ok(Self {
            data,
            mask: Some(mask),
        })
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Whether the sample at (row, col) is masked bad.
    #[inline]
    pub fn is_bad(&self, row: usize, col: usize) -> bool {
        match &self.mask {
            Some(mask) => mask[[row, col]],
            None => false,
        }
    }

    /// Whether any sample in this frame is masked bad.
    pub fn has_bad_samples(&self) -> bool {
        match &self.mask {
            Some(mask) => mask.iter().any(|&b| b),
            None => false,
        }
    }
}

/// Alignment offset of a frame relative to the reference.
///
/// The translation that must be subtracted from a frame's coordinates to
/// align it onto the reference frame's coordinate system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentOffset {
    pub dx: f64,
    pub dy: f64,
}

impl AlignmentOffset {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Component-wise floor, as used to split a prior estimate into its
    /// integer search origin.
    pub fn floor(&self) -> (i64, i64) {
        (self.dx.floor() as i64, self.dy.floor() as i64)
    }
}

/// An integer location in the reference frame, a candidate feature to
/// correlate on. Supplied by an external detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub x: i64,
    pub y: i64,
}

impl AnchorPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Half-extents bounding the 2-D correlation search and the per-candidate
/// measurement window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Half-width of the integer shift search range.
    pub search_half_width: usize,
    /// Half-height of the integer shift search range.
    pub search_half_height: usize,
    /// Half-width of the mean-squared-difference measurement window.
    pub measure_half_width: usize,
    /// Half-height of the mean-squared-difference measurement window.
    pub measure_half_height: usize,
}

impl SearchSpec {
    pub fn new(
        search_half_width: usize,
        search_half_height: usize,
        measure_half_width: usize,
        measure_half_height: usize,
    ) -> Self {
        Self {
            search_half_width,
            search_half_height,
            measure_half_width,
            measure_half_height,
        }
    }

    /// A degenerate measurement window cannot produce a reliable statistic.
    pub fn validate(&self) -> Result<()> {
        if self.measure_half_width + self.measure_half_height == 0 {
            return Err(CoaddError::IllegalInput(
                "measurement window half-extents are both zero".into(),
            ));
        }
        Ok(())
    }
}

/// Counts of low/high outlier samples discarded per output pixel before
/// averaging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionPolicy {
    /// Number of smallest samples to discard per pixel.
    pub rmin: usize,
    /// Number of largest samples to discard per pixel.
    pub rmax: usize,
}

impl RejectionPolicy {
    pub fn new(rmin: usize, rmax: usize) -> Self {
        Self { rmin, rmax }
    }

    /// Effective counts for a stack of `frame_count` frames.
    ///
    /// Rejection is a no-op when the stack is too small to reject from:
    /// `frame_count <= 3` or `frame_count <= 2 * (rmin + rmax)`.
    pub fn effective(&self, frame_count: usize) -> (usize, usize) {
        if frame_count <= 3 || frame_count <= 2 * (self.rmin + self.rmax) {
            (0, 0)
        } else {
            (self.rmin, self.rmax)
        }
    }
}
