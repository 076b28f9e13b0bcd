use serde::{Deserialize, Serialize};

use crate::error::{CoaddError, Result};
use crate::frame::AlignmentOffset;

/// Policy determining output canvas placement and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryMode {
    /// Canvas covers only the region where every frame contributes.
    #[default]
    Intersect,
    /// Canvas covers the outlier-trimmed union of all frame extents.
    Union,
    /// Canvas equals the first frame's extent.
    First,
}

impl std::fmt::Display for GeometryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryMode::Intersect => write!(f, "Intersect"),
            GeometryMode::Union => write!(f, "Union"),
            GeometryMode::First => write!(f, "First"),
        }
    }
}

/// Output canvas extent and its placement origin in reference coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CanvasLayout {
    pub width: usize,
    pub height: usize,
    pub start_x: f64,
    pub start_y: f64,
}

/// Compute the output canvas from all offsets, once per combine call.
///
/// In Union mode the rejection counts also trim the canvas extent: the
/// `rmin+1`-th smallest offset sets the start and the `rmax+1`-th largest
/// sets the far edge, per axis.
pub(crate) fn compute_canvas(
    mode: GeometryMode,
    ref_width: usize,
    ref_height: usize,
    offsets: &[AlignmentOffset],
    rmin: usize,
    rmax: usize,
) -> Result<CanvasLayout> {
    let xs: Vec<f64> = offsets.iter().map(|o| o.dx).collect();
    let ys: Vec<f64> = offsets.iter().map(|o| o.dy).collect();

    let (start_x, size_x) = axis_extent(mode, ref_width, &xs, rmin, rmax);
    let (start_y, size_y) = axis_extent(mode, ref_height, &ys, rmin, rmax);

    if size_x <= 0 || size_y <= 0 {
        return Err(CoaddError::IllegalOutput {
            width: size_x,
            height: size_y,
        });
    }

    Ok(CanvasLayout {
        width: size_x as usize,
        height: size_y as usize,
        start_x,
        start_y,
    })
}

fn axis_extent(mode: GeometryMode, ref_size: usize, offsets: &[f64], rmin: usize, rmax: usize) -> (f64, i64) {
    let n = offsets.len();
    match mode {
        GeometryMode::Intersect => {
            let mut lo = offsets[0];
            let mut hi = offsets[0];
            for &v in &offsets[1..] {
                lo = lo.min(v);
                hi = hi.max(v);
            }
            (hi, (ref_size as f64 - hi + lo).floor() as i64)
        }
        GeometryMode::Union => {
            let mut sorted = offsets.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let start = sorted[rmin.min(n - 1)];
            let far = sorted[n - 1 - rmax.min(n - 1)];
            (start, (ref_size as f64 + far - start).floor() as i64)
        }
        GeometryMode::First => (0.0, ref_size as i64),
    }
}
